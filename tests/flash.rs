use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use ledctl::flash::{IMAGE_SIZE, MAX_WORD_WRITES, WORD};
use ledctl::{Bounds, FlashStore, Settings, Storage};

const PAGE: usize = 4096;
const BASE: u32 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlashError {
    Overprogrammed,
    SetsBits,
    Kind(NorFlashErrorKind),
}

impl NorFlashError for FlashError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            FlashError::Kind(kind) => *kind,
            _ => NorFlashErrorKind::Other,
        }
    }
}

/// Two pages of NOR flash with nRF52 program limits.
struct MockFlash {
    bytes: Vec<u8>,
    /// Programs per word since its page was erased.
    programs: Vec<u8>,
    erases: usize,
    /// First rule violation seen, if any.
    violation: Option<FlashError>,
}

impl MockFlash {
    fn new() -> Self {
        Self {
            bytes: vec![0xff; 2 * PAGE],
            programs: vec![0; 2 * PAGE / WORD],
            erases: 0,
            violation: None,
        }
    }

    fn max_programs(&self) -> u8 {
        self.programs.iter().copied().max().unwrap_or(0)
    }

    fn fail(&mut self, err: FlashError) -> Result<(), FlashError> {
        self.violation.get_or_insert(err);
        Err(err)
    }
}

impl ErrorType for MockFlash {
    type Error = FlashError;
}

impl ReadNorFlash for MockFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        let src = self
            .bytes
            .get(offset..offset + bytes.len())
            .ok_or(FlashError::Kind(NorFlashErrorKind::OutOfBounds))?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl NorFlash for MockFlash {
    const WRITE_SIZE: usize = WORD;
    const ERASE_SIZE: usize = PAGE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from % PAGE != 0 || to % PAGE != 0 {
            return Err(FlashError::Kind(NorFlashErrorKind::NotAligned));
        }
        self.bytes[from..to].fill(0xff);
        self.programs[from / WORD..to / WORD].fill(0);
        self.erases += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        if offset % WORD != 0 || bytes.len() % WORD != 0 {
            return Err(FlashError::Kind(NorFlashErrorKind::NotAligned));
        }
        for (n, chunk) in bytes.chunks(WORD).enumerate() {
            let at = offset + n * WORD;
            let index = at / WORD;
            if self.programs[index] >= MAX_WORD_WRITES {
                return self.fail(FlashError::Overprogrammed);
            }
            let old = &self.bytes[at..at + WORD];
            if old.iter().zip(chunk).any(|(old, new)| new & !old != 0) {
                return self.fail(FlashError::SetsBits);
            }
            self.programs[index] += 1;
            self.bytes[at..at + WORD].copy_from_slice(chunk);
        }
        Ok(())
    }
}

fn store(flash: MockFlash) -> FlashStore<MockFlash> {
    FlashStore::new(flash, BASE).unwrap()
}

#[test]
fn descending_min_never_overprograms_a_word() {
    let mut settings = Settings::load(store(MockFlash::new())).unwrap();
    // Input 0's min shares word 10 with LED 6's period.
    for min in [0x07f0, 0x07e0, 0x07c0, 0x0780, 0x0700, 0x0600, 0x0400] {
        settings.set_min(0, min).unwrap();
        assert_eq!(settings.bounds(0).min, min);
    }

    let store = settings.into_storage();
    let flash = store.flash();
    assert_eq!(flash.violation, None);
    assert!(flash.max_programs() <= MAX_WORD_WRITES);
    assert!(flash.erases >= 1);

    let at = BASE as usize + 42;
    assert_eq!(&flash.bytes[at..at + 2], &0x0400u16.to_le_bytes());
}

#[test]
fn bit_clearing_writes_stay_in_place_until_the_limit() {
    let mut store = store(MockFlash::new());
    store.write(0, &[0x0f]).unwrap();
    store.write(0, &[0x07]).unwrap();
    assert_eq!(store.flash().erases, 0);

    // Third program of the same word.
    store.write(1, &[0x00]).unwrap();
    assert_eq!(store.flash().erases, 1);
    assert_eq!(store.flash().violation, None);
    assert_eq!(&store.flash().bytes[BASE as usize..BASE as usize + 2], &[0x07, 0x00]);
}

#[test]
fn setting_bits_erases_and_keeps_other_fields() {
    let mut store = store(MockFlash::new());
    store.write(8, &[0x12, 0x34]).unwrap();
    store.write(40, &[0x00]).unwrap();
    store.write(40, &[0xf0]).unwrap();

    let flash = store.flash();
    assert_eq!(flash.erases, 1);
    assert_eq!(flash.violation, None);
    let base = BASE as usize;
    assert_eq!(&flash.bytes[base + 8..base + 10], &[0x12, 0x34]);
    assert_eq!(flash.bytes[base + 40], 0xf0);
}

#[test]
fn unchanged_write_programs_nothing() {
    let mut store = store(MockFlash::new());
    store.write(4, &[0xff, 0xff]).unwrap();
    assert!(store.flash().programs.iter().all(|&n| n == 0));
}

#[test]
fn programmed_words_found_at_boot_count_as_full() {
    let mut flash = MockFlash::new();
    flash.bytes[BASE as usize..BASE as usize + 4].copy_from_slice(&[0x0f, 0xff, 0xff, 0xff]);
    let mut store = store(flash);

    let mut byte = [0];
    store.read(0, &mut byte).unwrap();
    assert_eq!(byte, [0x0f]);

    store.write(0, &[0x07]).unwrap();
    assert_eq!(store.flash().erases, 1);
    assert_eq!(store.flash().violation, None);
}

#[test]
fn settings_survive_a_reload() {
    let mut settings = Settings::load(store(MockFlash::new())).unwrap();
    for n in 0..3u16 {
        settings
            .set_bounds(
                usize::from(n),
                Bounds {
                    min: 1100 - 16 * n,
                    max: 1900 + 16 * n,
                },
            )
            .unwrap();
    }
    settings.set_min(2, 900).unwrap();

    let flash = settings.into_storage();
    let flash = MockFlash {
        bytes: flash.flash().bytes.clone(),
        programs: vec![0; 2 * PAGE / WORD],
        erases: 0,
        violation: None,
    };
    let reloaded = Settings::load(store(flash)).unwrap();
    assert_eq!(reloaded.bounds(0), Bounds { min: 1100, max: 1900 });
    assert_eq!(reloaded.bounds(1), Bounds { min: 1084, max: 1916 });
    assert_eq!(reloaded.bounds(2), Bounds { min: 900, max: 1932 });
}

#[test]
fn out_of_range_field_is_rejected() {
    let mut store = store(MockFlash::new());
    assert_eq!(
        store.write(IMAGE_SIZE - 1, &[0, 0]),
        Err(NorFlashErrorKind::OutOfBounds)
    );
    let mut buf = [0; 4];
    assert_eq!(
        store.read(IMAGE_SIZE, &mut buf),
        Err(NorFlashErrorKind::OutOfBounds)
    );
}
