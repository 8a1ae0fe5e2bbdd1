//! # LED Animation
//!
//! Per-output configuration and the pure part of the animation state
//! machine. An output's brightness comes from a constant or a calibrated
//! input, its period from a constant or an input, and its [`AnimationMode`]
//! decides, from the output's tick counter, whether that brightness is shown.
//!
//! ## Modes
//!
//! | mode           | `t < p`  | `p <= t < 2p` | wraps at |
//! |----------------|----------|---------------|----------|
//! | `Direct`       | source   | source        | never    |
//! | `InverseBlink` | 0        | source        | `2p`     |
//! | `Blink`        | source   | 0             | `2p`     |
//! | `ShortPulse`   | source while `t < 16`, else 0 | | `p` |
//!
//! Wrapping subtracts the cycle length from the counter rather than zeroing
//! it, so time spent past the end of a cycle carries into the next one.
use crate::INPUTS;

/// Ticks a `ShortPulse` output stays lit at the start of each period.
pub const SHORT_PULSE_TICKS: u16 = 16;

/// Where an output's brightness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessSource {
    Constant(u8),
    /// Normalized value of the given input.
    Signal(u8),
}

/// Where an output's period, in ticks, comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSource {
    Constant(u16),
    /// `16 + 4 * value` of the given input.
    Signal(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationMode {
    Direct,
    InverseBlink,
    Blink,
    ShortPulse,
}

impl AnimationMode {
    pub const ALL: [AnimationMode; 4] = [
        AnimationMode::Direct,
        AnimationMode::InverseBlink,
        AnimationMode::Blink,
        AnimationMode::ShortPulse,
    ];

    /// Decodes a stored mode byte; unknown values fall back to `Direct`.
    pub fn from_byte(byte: u8) -> Self {
        Self::ALL.get(byte as usize).copied().unwrap_or(AnimationMode::Direct)
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Counter value at which the cycle restarts, if the mode cycles.
    pub fn cycle(self, period: u16) -> Option<u32> {
        match self {
            AnimationMode::Direct => None,
            AnimationMode::InverseBlink | AnimationMode::Blink => Some(2 * u32::from(period)),
            AnimationMode::ShortPulse => Some(u32::from(period)),
        }
    }

    /// Brightness to show at tick `t` of the cycle.
    pub fn level(self, t: u16, period: u16, source: u8) -> u8 {
        match self {
            AnimationMode::Direct => source,
            AnimationMode::InverseBlink => {
                if t < period {
                    0
                } else {
                    source
                }
            }
            AnimationMode::Blink => {
                if t < period {
                    source
                } else {
                    0
                }
            }
            AnimationMode::ShortPulse => {
                if t < SHORT_PULSE_TICKS {
                    source
                } else {
                    0
                }
            }
        }
    }
}

/// Durable settings of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub brightness: BrightnessSource,
    pub mode: AnimationMode,
    pub period: PeriodSource,
}

impl ChannelConfig {
    /// Period in ticks given the current input values.
    pub fn period(&self, inputs: &[u8; INPUTS]) -> u16 {
        match self.period {
            PeriodSource::Constant(ticks) => ticks,
            PeriodSource::Signal(input) => 16 + u16::from(inputs[input as usize]) * 4,
        }
    }

    /// Brightness before animation, given the current input values.
    pub fn source_brightness(&self, inputs: &[u8; INPUTS]) -> u8 {
        match self.brightness {
            BrightnessSource::Constant(level) => level,
            BrightnessSource::Signal(input) => inputs[input as usize],
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            brightness: BrightnessSource::Constant(u8::MAX),
            mode: AnimationMode::Direct,
            period: PeriodSource::Constant(crate::settings::DEFAULT_PERIOD),
        }
    }
}
