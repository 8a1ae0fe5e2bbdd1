//! Bit-plane buffer shared between the animation engine and the frame
//! scheduler.
//!
//! Byte `p` holds bit `p` of every output's brightness, output `c` at bit `c`.
//! An update stores the eight planes one after another, so the scheduler can
//! render a frame that mixes old and new bits of the same output. That
//! one-frame glitch is accepted; there is no double buffer.
use core::sync::atomic::{AtomicU8, Ordering};

use crate::{OUTPUTS, PLANES};

pub struct BitPlanes {
    planes: [AtomicU8; PLANES],
}

impl BitPlanes {
    pub const fn new() -> Self {
        Self {
            planes: [const { AtomicU8::new(0) }; PLANES],
        }
    }

    /// Port byte for bit-plane `plane`.
    #[inline(always)]
    pub fn plane(&self, plane: usize) -> u8 {
        self.planes[plane].load(Ordering::Relaxed)
    }

    /// Spreads `brightness` across the planes at bit position `output`.
    ///
    /// Each plane is a separate read-modify-write, so only `output`'s bit
    /// changes even if other outputs are written concurrently.
    pub fn write(&self, output: usize, brightness: u8) {
        debug_assert!(output < OUTPUTS);
        let mask = 1u8 << output;
        for (bit, plane) in self.planes.iter().enumerate() {
            if brightness & (1 << bit) != 0 {
                plane.fetch_or(mask, Ordering::Relaxed);
            } else {
                plane.fetch_and(!mask, Ordering::Relaxed);
            }
        }
    }

    /// Reassembles the brightness currently stored for `output`.
    pub fn read(&self, output: usize) -> u8 {
        let mask = 1u8 << output;
        self.planes
            .iter()
            .enumerate()
            .filter(|(_, plane)| plane.load(Ordering::Relaxed) & mask != 0)
            .fold(0, |acc, (bit, _)| acc | (1 << bit))
    }

    pub fn clear(&self) {
        for plane in &self.planes {
            plane.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for BitPlanes {
    fn default() -> Self {
        Self::new()
    }
}
