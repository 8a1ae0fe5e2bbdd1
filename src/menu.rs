//! # Setup Menu
//!
//! Single-button configuration UI that talks back by blinking the LED being
//! configured. It is a plain state machine fed with [`MenuEvent`]s: one
//! `Tick` per tick-source period plus the button's `Pressed`/`Released`
//! edges. It never waits on anything itself.
//!
//! ## Navigation
//!
//! - **LED select**: each LED flashes in turn; release the button while an
//!   LED is on offer to pick it.
//! - **Choices** are offered one after another as blink counts (one blink
//!   for the first option, two for the second, ...). Release the button
//!   after the blinks to pick the option on offer.
//! - **Root** for the picked LED: brightness, animation mode, period, back.
//!   - Brightness: constant (a brightness ramp, release to keep the level
//!     shown) or signal (pick one of the inputs).
//!   - Mode: pick one of the four animation modes.
//!   - Period: hold the button for as long as the period should last, copy
//!     another LED's period, or follow an input.
//!
//! A finished choice is returned as a [`SettingChange`] for the caller to
//! persist.
use crate::{AnimationMode, BrightnessSource, PeriodSource, INPUTS, OUTPUTS};

/// Length of the flash offering an LED, and of each blink.
const FLASH_TICKS: u16 = 16;
/// How long an LED stays on offer.
const LED_OFFER_TICKS: u16 = 160;
/// How long an option stays on offer, counted from its first blink.
const OPTION_OFFER_TICKS: u16 = 180;
/// Ticks between brightness ramp steps.
const RAMP_TICKS: u16 = 2;
/// Presses are ignored for this many ticks after a release.
const DEBOUNCE_TICKS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    Tick,
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    Brightness { led: usize, source: BrightnessSource },
    Mode { led: usize, mode: AnimationMode },
    Period { led: usize, source: PeriodSource },
    /// Give `to` the period source of `from`.
    CopyPeriod { from: usize, to: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Root,
    BrightnessKind,
    BrightnessInput,
    Mode,
    PeriodKind,
    PeriodInput,
}

impl Choice {
    fn options(self) -> u8 {
        match self {
            Choice::Root => 4,
            Choice::BrightnessKind => 2,
            Choice::BrightnessInput | Choice::PeriodInput => INPUTS as u8,
            Choice::Mode => AnimationMode::ALL.len() as u8,
            Choice::PeriodKind => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Offering `led`. With `copy_to` set, the pick is the source of a
    /// period copy rather than the LED to configure.
    SelectLed { led: usize, copy_to: Option<usize> },
    /// Offering `option` of `choice`; `blink` counts the blinks shown so far.
    Choose {
        led: usize,
        choice: Choice,
        option: u8,
        blink: u8,
    },
    Ramp { led: usize, level: u8 },
    HoldToTime { led: usize, held: bool },
}

#[derive(Debug)]
pub struct Menu {
    state: State,
    /// Ticks since the current phase started.
    t: u16,
    /// Button level as last reported.
    pressed: bool,
    /// A press was accepted; the pick happens on release.
    armed: bool,
    debounce: u8,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            state: State::SelectLed {
                led: 0,
                copy_to: None,
            },
            t: 0,
            pressed: false,
            armed: false,
            debounce: 0,
        }
    }

    fn enter(&mut self, state: State) {
        self.state = state;
        self.t = 0;
    }

    fn choose(&mut self, led: usize, choice: Choice) {
        self.enter(State::Choose {
            led,
            choice,
            option: 0,
            blink: 0,
        });
    }

    /// LED the menu is talking through and the brightness it should show.
    pub fn display(&self) -> (usize, u8) {
        match self.state {
            State::SelectLed { led, .. } => (led, if self.t < FLASH_TICKS { u8::MAX } else { 0 }),
            State::Choose {
                led, option, blink, ..
            } => {
                let lit = blink <= option && self.t >= FLASH_TICKS && self.t < 2 * FLASH_TICKS;
                (led, if lit { u8::MAX } else { 0 })
            }
            State::Ramp { led, level } => (led, level),
            State::HoldToTime { led, held } => (led, if held { u8::MAX } else { 0 }),
        }
    }

    /// Feeds one event. Returns a setting to persist when a choice completes.
    pub fn handle(&mut self, event: MenuEvent) -> Option<SettingChange> {
        match event {
            MenuEvent::Tick => {
                self.tick();
                None
            }
            MenuEvent::Pressed => {
                self.press();
                None
            }
            MenuEvent::Released => self.release(),
        }
    }

    fn tick(&mut self) {
        self.t = self.t.saturating_add(1);
        self.debounce = self.debounce.saturating_sub(1);
        if self.armed {
            return;
        }
        match &mut self.state {
            State::SelectLed { led, .. } => {
                if self.t >= LED_OFFER_TICKS {
                    *led = (*led + 1) % OUTPUTS;
                    self.t = 0;
                }
            }
            State::Choose {
                choice,
                option,
                blink,
                ..
            } => {
                if *blink < *option && self.t >= 2 * FLASH_TICKS {
                    *blink += 1;
                    self.t = 0;
                } else if *blink == *option && self.t >= 2 * FLASH_TICKS {
                    // Last blink done; the offer window runs on from here.
                    *blink += 1;
                } else if *blink > *option && self.t >= OPTION_OFFER_TICKS {
                    *option = (*option + 1) % choice.options();
                    *blink = 0;
                    self.t = 0;
                }
            }
            State::Ramp { level, .. } => {
                if self.t >= RAMP_TICKS {
                    *level = level.wrapping_add(1);
                    self.t = 0;
                }
            }
            State::HoldToTime { .. } => {}
        }
        // A button held down into an offer window counts as a press.
        if self.pressed {
            self.accept();
        }
    }

    fn press(&mut self) {
        self.pressed = true;
        self.accept();
    }

    /// Arms the pick if the button is down while something is on offer.
    fn accept(&mut self) {
        if self.debounce > 0 || self.armed {
            return;
        }
        match &mut self.state {
            State::SelectLed { .. } => self.armed = self.t >= FLASH_TICKS,
            State::Choose { option, blink, .. } => self.armed = *blink > *option,
            State::Ramp { .. } => self.armed = true,
            State::HoldToTime { held, .. } => {
                if !*held && self.pressed {
                    *held = true;
                    self.t = 0;
                }
            }
        }
    }

    fn release(&mut self) -> Option<SettingChange> {
        self.pressed = false;
        if let State::HoldToTime { led, held: true } = self.state {
            let ticks = self.t;
            self.debounce = DEBOUNCE_TICKS;
            self.choose(led, Choice::Root);
            return Some(SettingChange::Period {
                led,
                source: PeriodSource::Constant(ticks),
            });
        }
        if !self.armed {
            return None;
        }
        self.armed = false;
        self.debounce = DEBOUNCE_TICKS;
        self.pick()
    }

    /// Acts on whatever was on offer when the button was released.
    fn pick(&mut self) -> Option<SettingChange> {
        match self.state {
            State::SelectLed { led, copy_to: None } => {
                self.choose(led, Choice::Root);
                None
            }
            State::SelectLed {
                led: from,
                copy_to: Some(to),
            } => {
                self.choose(to, Choice::Root);
                Some(SettingChange::CopyPeriod { from, to })
            }
            State::Choose {
                led, choice, option, ..
            } => self.pick_option(led, choice, option),
            State::Ramp { led, level } => {
                self.choose(led, Choice::Root);
                Some(SettingChange::Brightness {
                    led,
                    source: BrightnessSource::Constant(level),
                })
            }
            State::HoldToTime { .. } => None,
        }
    }

    fn pick_option(&mut self, led: usize, choice: Choice, option: u8) -> Option<SettingChange> {
        match (choice, option) {
            (Choice::Root, 0) => self.choose(led, Choice::BrightnessKind),
            (Choice::Root, 1) => self.choose(led, Choice::Mode),
            (Choice::Root, 2) => self.choose(led, Choice::PeriodKind),
            (Choice::Root, _) => self.enter(State::SelectLed {
                led: 0,
                copy_to: None,
            }),
            (Choice::BrightnessKind, 0) => self.enter(State::Ramp { led, level: 0 }),
            (Choice::BrightnessKind, _) => self.choose(led, Choice::BrightnessInput),
            (Choice::BrightnessInput, input) => {
                self.choose(led, Choice::Root);
                return Some(SettingChange::Brightness {
                    led,
                    source: BrightnessSource::Signal(input),
                });
            }
            (Choice::Mode, mode) => {
                self.choose(led, Choice::Root);
                return Some(SettingChange::Mode {
                    led,
                    mode: AnimationMode::from_byte(mode),
                });
            }
            (Choice::PeriodKind, 0) => self.enter(State::HoldToTime { led, held: false }),
            (Choice::PeriodKind, 1) => self.enter(State::SelectLed {
                led: 0,
                copy_to: Some(led),
            }),
            (Choice::PeriodKind, _) => self.choose(led, Choice::PeriodInput),
            (Choice::PeriodInput, input) => {
                self.choose(led, Choice::Root);
                return Some(SettingChange::Period {
                    led,
                    source: PeriodSource::Signal(input),
                });
            }
        }
        None
    }
}
