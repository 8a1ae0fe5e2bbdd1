//! # Signal Calibrator
//!
//! Turns raw pulse widths into a 0-255 value without being told the expected
//! range. While calibrating, each input's `[min, max]` bounds grow towards
//! the samples it sees, one fixed step at a time, so a single outlier only
//! widens the range by one step.
//!
//! ## Normalization
//!
//! ```text
//! divisor = max(1, (max - min - 2 * step) >> 8)
//! value   = clamp((width - min + step) / divisor, 0, 255)    (0 if width < min)
//! ```
//!
//! The `2 * step` headroom keeps boundary noise from pinning the output at
//! either end.
use crate::{Bounds, INPUTS};

/// Default distance bounds move per adjustment, in counter ticks.
pub const DEFAULT_STEP: u16 = 16;
/// Pulses narrower than this are treated as noise.
pub const DEFAULT_MIN_PULSE: u16 = 100;

/// Whether bounds may move. Chosen once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Calibrating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputChannel {
    pub min: u16,
    pub max: u16,
    /// Set by the first sample seen while calibrating.
    pub calibrated: bool,
    pub divisor: u8,
    pub value: u8,
}

impl InputChannel {
    /// Bounds that break `min <= max` are replaced by the defaults.
    pub fn new(bounds: Bounds, step: u16) -> Self {
        let bounds = bounds.sanitized();
        let mut channel = Self {
            min: bounds.min,
            max: bounds.max,
            calibrated: false,
            divisor: 1,
            value: 0,
        };
        channel.update_divisor(step);
        channel
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.min,
            max: self.max,
        }
    }

    fn update_divisor(&mut self, step: u16) {
        let span = self
            .max
            .saturating_sub(self.min)
            .saturating_sub(step.saturating_mul(2));
        self.divisor = ((span >> 8) as u8).max(1);
    }

    /// Normalized value of `width` against the current bounds.
    pub fn normalize(&self, width: u16, step: u16) -> u8 {
        if width < self.min {
            return 0;
        }
        let scaled = (u32::from(width - self.min) + u32::from(step)) / u32::from(self.divisor);
        scaled.min(255) as u8
    }
}

/// Result of feeding one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update {
    pub value: u8,
    pub min_moved: bool,
    pub max_moved: bool,
}

impl Update {
    pub fn bounds_moved(&self) -> bool {
        self.min_moved || self.max_moved
    }
}

#[derive(Debug)]
pub struct Calibrator {
    inputs: [InputChannel; INPUTS],
    mode: Mode,
    step: u16,
    min_pulse: u16,
}

impl Calibrator {
    pub fn new(bounds: [Bounds; INPUTS], mode: Mode) -> Self {
        Self::with_step(bounds, mode, DEFAULT_STEP, DEFAULT_MIN_PULSE)
    }

    /// A zero `step` is raised to 1.
    pub fn with_step(bounds: [Bounds; INPUTS], mode: Mode, step: u16, min_pulse: u16) -> Self {
        let step = step.max(1);
        Self {
            inputs: bounds.map(|b| InputChannel::new(b, step)),
            mode,
            step,
            min_pulse,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn step(&self) -> u16 {
        self.step
    }

    pub fn input(&self, input: usize) -> &InputChannel {
        &self.inputs[input]
    }

    /// Latest normalized value of `input`.
    pub fn value(&self, input: usize) -> u8 {
        self.inputs[input].value
    }

    pub fn values(&self) -> [u8; INPUTS] {
        self.inputs.map(|i| i.value)
    }

    /// Processes one raw pulse width for `input`.
    ///
    /// Returns `None` when the pulse is narrower than the noise threshold;
    /// the channel is left untouched in that case. Moved bounds are reported
    /// so the caller can persist them.
    pub fn feed(&mut self, input: usize, width: u16) -> Option<Update> {
        if width < self.min_pulse {
            return None;
        }
        let step = self.step;
        let channel = &mut self.inputs[input];
        let mut update = Update::default();

        if self.mode == Mode::Calibrating {
            if !channel.calibrated {
                channel.min = width;
                channel.max = width;
                channel.divisor = 1;
                channel.calibrated = true;
                update.min_moved = true;
                update.max_moved = true;
            } else if width < channel.min {
                // Both walks stop strictly past the sample.
                let steps = (channel.min - width) / step + 1;
                channel.min = channel.min.saturating_sub(steps.saturating_mul(step));
                update.min_moved = true;
            } else if width > channel.max {
                let steps = (width - channel.max) / step + 1;
                channel.max = channel.max.saturating_add(steps.saturating_mul(step));
                update.max_moved = true;
            }
            if update.bounds_moved() {
                channel.update_divisor(step);
            }
        }

        channel.value = channel.normalize(width, step);
        update.value = channel.value;
        Some(update)
    }
}
