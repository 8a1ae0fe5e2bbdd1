//! # User Interface Module
//!
//! Drives the setup [`Menu`] from button A and the tick source while the
//! controller is in setup mode.
//!
//! ## Control Scheme
//!
//! - **Hold A at boot**: enter setup (inputs calibrate while in setup)
//! - **Release A** while an LED or option is on offer: pick it
//! - **Hold A** while setting a period: the LED stays lit, the hold time
//!   becomes the period
//!
//! The menu only ever lights the LED it is talking through; the animation
//! engine does not run in setup mode.
use crate::*;

/// Tick counter the menu takes its time from.
const MENU_CLOCK: usize = 0;

/// Setup-mode controller that turns button edges and ticks into menu events.
pub struct Ui {
    button: Button,
    menu: Menu,
    /// Button level at the previous poll.
    pressed: bool,
    /// Tick counter value at the previous poll.
    last_tick: u16,
    /// LED the menu lit last.
    shown: Option<usize>,
}

impl Ui {
    /// The button is usually still held from boot; its release is not
    /// taken as a pick.
    pub fn new(button: Button) -> Self {
        let pressed = button.is_low();
        Self {
            button,
            menu: Menu::new(),
            pressed,
            last_tick: SHARED.ticks.get(MENU_CLOCK),
            shown: None,
        }
    }

    /// Feeds one event to the menu and persists whatever it completes.
    fn feed<S: Storage>(&mut self, engine: &mut Engine<'_, S>, event: MenuEvent) {
        if let Some(change) = self.menu.handle(event) {
            rprintln!("setup: {:?}", change);
            if let Err(err) = engine.apply(change) {
                rprintln!("setup: storage write failed: {:?}", err);
            }
        }
    }

    /// One main-loop pass of the setup UI.
    ///
    /// Button edges are reported before the ticks that elapsed since the
    /// previous pass, then the menu's display is put on the LEDs.
    pub fn poll<S: Storage>(&mut self, engine: &mut Engine<'_, S>) {
        let pressed = self.button.is_low();
        if pressed != self.pressed {
            self.pressed = pressed;
            let event = if pressed {
                MenuEvent::Pressed
            } else {
                MenuEvent::Released
            };
            self.feed(engine, event);
        }

        let now = SHARED.ticks.get(MENU_CLOCK);
        let elapsed = now.wrapping_sub(self.last_tick);
        self.last_tick = now;
        for _ in 0..elapsed {
            self.feed(engine, MenuEvent::Tick);
        }

        let (led, level) = self.menu.display();
        if self.shown != Some(led) {
            if let Some(previous) = self.shown {
                engine.show(previous, 0);
            }
            self.shown = Some(led);
        }
        engine.show(led, level);
    }
}
