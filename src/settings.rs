//! # Configuration Store
//!
//! Durable per-output settings and per-input calibration bounds, kept in a
//! byte-addressable [`Storage`]. Everything is read once at boot into working
//! memory. Afterwards each setter updates working memory and writes back only
//! the fields whose value actually changed, to keep wear down.
//!
//! ## Layout
//!
//! ```text
//! offset  size     field
//!  0      1 x 7    brightness source mode   (0..=2 input, else constant)
//!  7      1 x 7    constant brightness
//! 14      1 x 7    animation mode
//! 21      1 x 7    period source mode       (0..=2 input, else constant)
//! 28      2 x 7    constant period, ticks   (little-endian)
//! 42      2 x 3    calibrated min           (little-endian)
//! 48      2 x 3    calibrated max           (little-endian)
//! ```
//!
//! Values are not validated by the engine; this is the only place they are
//! clamped into range.
use crate::{AnimationMode, BrightnessSource, ChannelConfig, PeriodSource, INPUTS, OUTPUTS};

/// Source-mode byte written for constant sources.
pub const CONSTANT: u8 = 10;

/// Period used when the stored one reads as erased.
pub const DEFAULT_PERIOD: u16 = 80;
/// Bounds used when the stored ones are erased or inconsistent.
pub const DEFAULT_BOUNDS: Bounds = Bounds {
    min: 1000,
    max: 2000,
};

const ERASED_WORD: u16 = 0xffff;

const BRIGHTNESS_MODE: usize = 0;
const BRIGHTNESS: usize = BRIGHTNESS_MODE + OUTPUTS;
const ANIMATION_MODE: usize = BRIGHTNESS + OUTPUTS;
const PERIOD_MODE: usize = ANIMATION_MODE + OUTPUTS;
const PERIOD: usize = PERIOD_MODE + OUTPUTS;
const SIGNAL_MIN: usize = PERIOD + 2 * OUTPUTS;
const SIGNAL_MAX: usize = SIGNAL_MIN + 2 * INPUTS;

/// Total bytes used in the store.
pub const LAYOUT_SIZE: usize = SIGNAL_MAX + 2 * INPUTS;

/// Byte-addressable durable storage.
///
/// Calls may take a while (flash, EEPROM) and must only be made from the
/// main loop.
pub trait Storage {
    type Error: core::fmt::Debug;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error>;
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    type Error = S::Error;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(offset, data)
    }
}

/// Calibration range of one input, in counter ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u16,
    pub max: u16,
}

impl Bounds {
    /// Erased (`0xffff`) or inverted bounds become [`DEFAULT_BOUNDS`].
    pub fn sanitized(self) -> Self {
        let erased = self.min == ERASED_WORD && self.max == ERASED_WORD;
        if erased || self.min > self.max {
            DEFAULT_BOUNDS
        } else {
            self
        }
    }
}

fn decode_input(byte: u8) -> Option<u8> {
    (usize::from(byte) < INPUTS).then_some(byte)
}

fn clamp_input(input: u8) -> u8 {
    input.min(INPUTS as u8 - 1)
}

pub struct Settings<S> {
    storage: S,
    /// Last bytes known to be in `storage`.
    image: [u8; LAYOUT_SIZE],
    outputs: [ChannelConfig; OUTPUTS],
    bounds: [Bounds; INPUTS],
}

impl<S: Storage> Settings<S> {
    /// Reads the whole configuration. Nothing is written back, even if
    /// values had to be sanitized.
    pub fn load(mut storage: S) -> Result<Self, S::Error> {
        let mut image = [0u8; LAYOUT_SIZE];
        storage.read(0, &mut image)?;

        let word = |offset: usize| u16::from_le_bytes([image[offset], image[offset + 1]]);

        let outputs = core::array::from_fn(|led| {
            let brightness = match decode_input(image[BRIGHTNESS_MODE + led]) {
                Some(input) => BrightnessSource::Signal(input),
                None => BrightnessSource::Constant(image[BRIGHTNESS + led]),
            };
            let period = match decode_input(image[PERIOD_MODE + led]) {
                Some(input) => PeriodSource::Signal(input),
                None => match word(PERIOD + 2 * led) {
                    ERASED_WORD => PeriodSource::Constant(DEFAULT_PERIOD),
                    ticks => PeriodSource::Constant(ticks),
                },
            };
            ChannelConfig {
                brightness,
                mode: AnimationMode::from_byte(image[ANIMATION_MODE + led]),
                period,
            }
        });

        let bounds = core::array::from_fn(|input| {
            Bounds {
                min: word(SIGNAL_MIN + 2 * input),
                max: word(SIGNAL_MAX + 2 * input),
            }
            .sanitized()
        });

        Ok(Self {
            storage,
            image,
            outputs,
            bounds,
        })
    }

    pub fn output(&self, led: usize) -> &ChannelConfig {
        &self.outputs[led]
    }

    pub fn outputs(&self) -> &[ChannelConfig; OUTPUTS] {
        &self.outputs
    }

    pub fn bounds(&self, input: usize) -> Bounds {
        self.bounds[input]
    }

    pub fn all_bounds(&self) -> [Bounds; INPUTS] {
        self.bounds
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Writes one field, unless storage already holds exactly `data`.
    fn put(&mut self, offset: usize, data: &[u8]) -> Result<(), S::Error> {
        let field = &mut self.image[offset..offset + data.len()];
        if *field != *data {
            self.storage.write(offset, data)?;
            field.copy_from_slice(data);
        }
        Ok(())
    }

    pub fn set_brightness_source(
        &mut self,
        led: usize,
        source: BrightnessSource,
    ) -> Result<(), S::Error> {
        let source = match source {
            BrightnessSource::Signal(input) => BrightnessSource::Signal(clamp_input(input)),
            source => source,
        };
        self.outputs[led].brightness = source;
        match source {
            BrightnessSource::Constant(level) => {
                self.put(BRIGHTNESS + led, &[level])?;
                self.put(BRIGHTNESS_MODE + led, &[CONSTANT])
            }
            BrightnessSource::Signal(input) => self.put(BRIGHTNESS_MODE + led, &[input]),
        }
    }

    pub fn set_animation_mode(&mut self, led: usize, mode: AnimationMode) -> Result<(), S::Error> {
        self.outputs[led].mode = mode;
        self.put(ANIMATION_MODE + led, &[mode.to_byte()])
    }

    pub fn set_period_source(&mut self, led: usize, source: PeriodSource) -> Result<(), S::Error> {
        let source = match source {
            PeriodSource::Signal(input) => PeriodSource::Signal(clamp_input(input)),
            source => source,
        };
        self.outputs[led].period = source;
        match source {
            PeriodSource::Constant(ticks) => {
                self.put(PERIOD + 2 * led, &ticks.to_le_bytes())?;
                self.put(PERIOD_MODE + led, &[CONSTANT])
            }
            PeriodSource::Signal(input) => self.put(PERIOD_MODE + led, &[input]),
        }
    }

    pub fn set_min(&mut self, input: usize, min: u16) -> Result<(), S::Error> {
        self.bounds[input].min = min;
        self.put(SIGNAL_MIN + 2 * input, &min.to_le_bytes())
    }

    pub fn set_max(&mut self, input: usize, max: u16) -> Result<(), S::Error> {
        self.bounds[input].max = max;
        self.put(SIGNAL_MAX + 2 * input, &max.to_le_bytes())
    }

    /// Persists both bounds of `input`, each only if it changed.
    pub fn set_bounds(&mut self, input: usize, bounds: Bounds) -> Result<(), S::Error> {
        self.set_min(input, bounds.min)?;
        self.set_max(input, bounds.max)
    }
}
