//! # Main-Loop Engine
//!
//! One [`Engine::poll`] is one pass of the firmware's main loop:
//!
//! 1. Take each input's pending sample, if any, and feed it to the
//!    [`Calibrator`]. Bounds that moved are persisted.
//! 2. For every output, resolve period and source brightness, run the
//!    animation against the output's tick counter, gamma-correct the result
//!    and spread it over the bit-planes.
//!
//! Nothing here blocks except storage writes, which is why bounds are
//! persisted from here and never from the capture interrupt.
use crate::{
    Calibrator, Gamma, Mode, SettingChange, Settings, Shared, Storage, INPUTS, OUTPUTS,
};

pub struct Engine<'a, S> {
    shared: &'a Shared,
    settings: Settings<S>,
    calibrator: Calibrator,
    gamma: Gamma,
    /// Inputs whose moved bounds failed to persist.
    unsaved: u8,
}

impl<'a, S: Storage> Engine<'a, S> {
    pub fn new(shared: &'a Shared, settings: Settings<S>, mode: Mode) -> Self {
        let calibrator = Calibrator::new(settings.all_bounds(), mode);
        Self::with_calibrator(shared, settings, calibrator)
    }

    pub fn with_calibrator(shared: &'a Shared, settings: Settings<S>, calibrator: Calibrator) -> Self {
        Self {
            shared,
            settings,
            calibrator,
            gamma: Gamma::new(),
            unsaved: 0,
        }
    }

    pub fn shared(&self) -> &'a Shared {
        self.shared
    }

    pub fn settings(&self) -> &Settings<S> {
        &self.settings
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn into_settings(self) -> Settings<S> {
        self.settings
    }

    /// Calibrates every input with a pending sample.
    ///
    /// Returns a mask of the inputs whose bounds moved during this call.
    /// Bounds that could not be written are retried on the next call.
    pub fn service_inputs(&mut self) -> Result<u8, S::Error> {
        let mut moved = 0;
        for input in 0..INPUTS {
            let Some(width) = self.shared.samples.take(input) else {
                continue;
            };
            if let Some(update) = self.calibrator.feed(input, width) {
                if update.bounds_moved() {
                    moved |= 1 << input;
                    self.unsaved |= 1 << input;
                }
            }
        }
        for input in 0..INPUTS {
            if self.unsaved & (1 << input) != 0 {
                let bounds = self.calibrator.input(input).bounds();
                self.settings.set_bounds(input, bounds)?;
                self.unsaved &= !(1 << input);
            }
        }
        Ok(moved)
    }

    /// Animates all outputs. Returns the brightness chosen for each, before
    /// perceptual correction.
    pub fn render(&mut self) -> [u8; OUTPUTS] {
        let inputs = self.calibrator.values();
        core::array::from_fn(|led| self.animate(led, &inputs))
    }

    fn animate(&self, led: usize, inputs: &[u8; INPUTS]) -> u8 {
        let config = self.settings.output(led);
        let period = config.period(inputs);
        let source = config.source_brightness(inputs);

        let ticks = &self.shared.ticks;
        let mut t = ticks.get(led);
        if let Some(cycle) = config.mode.cycle(period) {
            if u32::from(t) >= cycle {
                t = ticks.rewind(led, cycle);
            }
        }

        let level = config.mode.level(t, period, source);
        self.show(led, level);
        level
    }

    /// Puts `brightness` on `led` right away, bypassing the animation.
    pub fn show(&self, led: usize, brightness: u8) {
        self.shared.planes.write(led, self.gamma.correct(brightness));
    }

    /// One main-loop pass. Outputs are rendered even if persisting bounds
    /// failed.
    pub fn poll(&mut self) -> Result<u8, S::Error> {
        let moved = self.service_inputs();
        self.render();
        moved
    }

    /// Applies a change made through the setup menu.
    pub fn apply(&mut self, change: SettingChange) -> Result<(), S::Error> {
        match change {
            SettingChange::Brightness { led, source } => {
                self.settings.set_brightness_source(led, source)
            }
            SettingChange::Mode { led, mode } => self.settings.set_animation_mode(led, mode),
            SettingChange::Period { led, source } => self.settings.set_period_source(led, source),
            SettingChange::CopyPeriod { from, to } => {
                let source = self.settings.output(from).period;
                self.settings.set_period_source(to, source)
            }
        }
    }
}
