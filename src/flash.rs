//! # Flash Settings Store
//!
//! [`Storage`] over one erase page of NOR flash, with the settings image
//! mirrored in RAM. The image is read once at boot.
//!
//! NOR flash can only clear bits, and each word may only be programmed
//! [`MAX_WORD_WRITES`] times between erases. A write that only clears bits
//! of words still under their limit is programmed in place; anything else
//! erases the page and programs the whole image again.
use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use crate::settings::LAYOUT_SIZE;
use crate::Storage;

/// Programs allowed per flash word between two erases (nRF52 `nWRITE`).
pub const MAX_WORD_WRITES: u8 = 2;

/// Flash word size in bytes. Programming happens a word at a time.
pub const WORD: usize = 4;
/// Image size rounded up to whole words.
pub const IMAGE_SIZE: usize = (LAYOUT_SIZE + WORD - 1) & !(WORD - 1);
const WORDS: usize = IMAGE_SIZE / WORD;
const ERASED: [u8; WORD] = [0xff; WORD];

pub struct FlashStore<F> {
    flash: F,
    /// Start of the page; must be erase-aligned.
    base: u32,
    image: [u8; IMAGE_SIZE],
    /// Programs of each word since the page was last erased.
    writes: [u8; WORDS],
}

fn word(image: &[u8; IMAGE_SIZE], index: usize) -> &[u8] {
    &image[index * WORD..(index + 1) * WORD]
}

impl<F: NorFlash> FlashStore<F> {
    /// Reads the image at `base`. Words that are not erased may already
    /// have used up their programs, so they count as full.
    pub fn new(mut flash: F, base: u32) -> Result<Self, NorFlashErrorKind> {
        let mut image = [0xff; IMAGE_SIZE];
        flash.read(base, &mut image).map_err(|e| e.kind())?;
        let writes = core::array::from_fn(|index| {
            if word(&image, index) == ERASED {
                0
            } else {
                MAX_WORD_WRITES
            }
        });
        Ok(Self {
            flash,
            base,
            image,
            writes,
        })
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    fn address(&self, index: usize) -> u32 {
        self.base + (index * WORD) as u32
    }

    fn program(&mut self, index: usize, next: &[u8; IMAGE_SIZE]) -> Result<(), NorFlashErrorKind> {
        let offset = self.address(index);
        self.flash
            .write(offset, word(next, index))
            .map_err(|e| e.kind())?;
        self.writes[index] += 1;
        Ok(())
    }

    fn rewrite(&mut self, next: &[u8; IMAGE_SIZE]) -> Result<(), NorFlashErrorKind> {
        self.flash
            .erase(self.base, self.base + F::ERASE_SIZE as u32)
            .map_err(|e| e.kind())?;
        self.writes = [0; WORDS];
        for index in 0..WORDS {
            if word(next, index) != ERASED {
                self.program(index, next)?;
            }
        }
        Ok(())
    }
}

impl<F: NorFlash> Storage for FlashStore<F> {
    type Error = NorFlashErrorKind;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        let field = self
            .image
            .get(offset..offset + buf.len())
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        buf.copy_from_slice(field);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        let mut next = self.image;
        next.get_mut(offset..offset + data.len())
            .ok_or(NorFlashErrorKind::OutOfBounds)?
            .copy_from_slice(data);

        let changed = (0..WORDS)
            .filter(|&index| word(&self.image, index) != word(&next, index))
            .fold(0u32, |mask, index| mask | 1 << index);
        let needs_erase = (0..WORDS)
            .filter(|&index| changed & (1 << index) != 0)
            .any(|index| {
                let sets_bits = word(&self.image, index)
                    .iter()
                    .zip(word(&next, index))
                    .any(|(old, new)| new & !old != 0);
                sets_bits || self.writes[index] >= MAX_WORD_WRITES
            });

        let result = if needs_erase {
            self.rewrite(&next)
        } else {
            (0..WORDS)
                .filter(|&index| changed & (1 << index) != 0)
                .try_for_each(|index| self.program(index, &next))
        };
        if let Err(err) = result {
            // Flash contents are unknown now; the next write starts over.
            self.writes = [MAX_WORD_WRITES; WORDS];
            return Err(err);
        }
        self.image = next;
        Ok(())
    }
}
