//! # LED Output Module
//!
//! Drives the seven LED pins from the shared bit-planes with binary-coded
//! modulation, straight from the TIMER1 interrupt.
//!
//! ## Timing
//!
//! TIMER1 counts at 125 kHz. Compare 0 sits at 256 and clears the counter,
//! standing in for the overflow of an 8-bit counter. Compare 1 is moved by
//! every frame to the end of the next plane's slot:
//! ```text
//! cycle = 256 / 125 kHz = 2.048 ms (488 Hz refresh), plane 0 = 8 µs
//! ```
//! The interrupt has the highest priority in the firmware. The main loop
//! never delays a frame; only flash operations, which stall the whole CPU,
//! can.
//!
//! ## Shared State
//!
//! Reads the bit-planes the engine writes. A plane can change between two
//! frames of the same cycle, which shows as a one-cycle glitch on an output
//! whose brightness is being updated.
use core::cell::RefCell;

use crate::*;

const OVERFLOW: usize = 0;
const COMPARE: usize = 1;

/// Type alias for the LED pin array, index `n` driving bit `n` of each plane.
type LedPins = [Output<'static, AnyPin>; OUTPUTS];
pub type FrameTimer = timer::Timer<'static, peripherals::TIMER1>;

/// BCM driver for the LED pins. Owned by the TIMER1 interrupt once started.
pub struct Leds {
    pins: LedPins,
    scheduler: FrameScheduler,
    timer: FrameTimer,
}

static LEDS: Mutex<CriticalSectionRawMutex, RefCell<Option<Leds>>> =
    Mutex::new(RefCell::new(None));

fn frame_regs() -> &'static pac::timer0::RegisterBlock {
    // SAFETY: TIMER1 belongs to `Leds`; only its event and interrupt
    // registers are touched through this pointer.
    unsafe { &*pac::TIMER1::ptr() }
}

/// Clears compare event `n` and reports whether it had fired.
fn take_event(n: usize) -> bool {
    let event = &frame_regs().events_compare[n];
    if event.read().bits() == 0 {
        return false;
    }
    event.write(|w| unsafe { w.bits(0) });
    true
}

impl Leds {
    pub fn new(pins: LedPins, timer: FrameTimer) -> Self {
        Self {
            pins,
            scheduler: FrameScheduler::new(),
            timer,
        }
    }

    /// Writes one plane to the pins, one bit per pin.
    fn write_port(&mut self, port: u8) {
        for (led, pin) in self.pins.iter_mut().enumerate() {
            if port & (1 << led) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
    }

    fn show(&mut self, frame: Frame) {
        self.write_port(frame.port);
        self.timer.cc(COMPARE).write(u32::from(frame.compare));
    }

    /// Starts modulation. From here on the pins belong to the TIMER1
    /// interrupt.
    pub fn start(mut self) {
        self.timer.set_frequency(timer::Frequency::F125kHz);
        self.timer.cc(OVERFLOW).write(u32::from(CYCLE_TICKS));
        self.timer.cc(OVERFLOW).short_compare_clear();
        self.timer.cc(COMPARE).write(1);
        frame_regs()
            .intenset
            .write(|w| w.compare0().set().compare1().set());
        self.timer.start();

        LEDS.lock(|leds| *leds.borrow_mut() = Some(self));
        interrupt::TIMER1.set_priority(Priority::P1);
        // SAFETY: the handler only touches `LEDS`, which is set up above.
        unsafe { interrupt::TIMER1.enable() };
    }
}

#[interrupt]
fn TIMER1() {
    LEDS.lock(|leds| {
        let mut leds = leds.borrow_mut();
        let Some(leds) = leds.as_mut() else {
            return;
        };
        if take_event(OVERFLOW) {
            let frame = leds.scheduler.on_overflow(&SHARED.planes);
            leds.show(frame);
        }
        if take_event(COMPARE) {
            let frame = leds.scheduler.on_compare_match(&SHARED.planes);
            leds.show(frame);
        }
    });
}
