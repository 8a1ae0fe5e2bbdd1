//! Perceptual brightness correction.
//!
//! The eye responds roughly logarithmically, so the linear 0-255 brightness
//! is mapped through `2^(8x/255) - 1` before it reaches the bit-planes.
use num_traits::Float;

pub struct Gamma([u8; 256]);

impl Gamma {
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        for (x, entry) in table.iter_mut().enumerate() {
            let exponent = 8.0f32 * x as f32 / 255.0;
            let y = Float::round(Float::exp2(exponent) - 1.0);
            *entry = Float::min(Float::max(y, 0.0), 255.0) as u8;
        }
        Self(table)
    }

    #[inline]
    pub fn correct(&self, brightness: u8) -> u8 {
        self.0[brightness as usize]
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self::new()
    }
}
