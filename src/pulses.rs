//! # Pulse Input Module
//!
//! Measures RC-style pulses on three edge pins. Every edge on any of the
//! pins samples all three levels together with a free-running microsecond
//! counter and hands both to the [`PulseCapture`] handler, which posts
//! finished pulse widths to the shared mailbox.
//!
//! The counter is TIMER2 at 1 MHz, cleared by its compare 0 at
//! [`CAPTURE_WRAP`]. Each edge latches it through compare 1. The capture
//! task runs on the high-priority executor, so the time read is the time
//! of the edge to within interrupt latency, whatever the main loop is doing.
use crate::*;

/// Period of the capture counter in microseconds. The counter restarts at
/// zero after `CAPTURE_WRAP - 1`.
pub const CAPTURE_WRAP: u32 = 50_000;

const WRAP_CC: usize = 0;
const SNAPSHOT_CC: usize = 1;

type PulsePins = [Input<'static, AnyPin>; INPUTS];
pub type CaptureClock = timer::Timer<'static, peripherals::TIMER2>;

pub struct Pulses {
    inputs: PulsePins,
    capture: PulseCapture,
    clock: CaptureClock,
}

impl Pulses {
    /// Starts the capture counter.
    pub fn new(inputs: PulsePins, mut clock: CaptureClock) -> Self {
        clock.set_frequency(timer::Frequency::F1MHz);
        clock.cc(WRAP_CC).write(CAPTURE_WRAP);
        clock.cc(WRAP_CC).short_compare_clear();
        clock.start();
        Self {
            inputs,
            capture: PulseCapture::new(CAPTURE_WRAP),
            clock,
        }
    }

    /// Free-running capture counter.
    fn now(&mut self) -> u16 {
        self.clock.cc(SNAPSHOT_CC).capture() as u16
    }

    /// Input levels, input `n` in bit `n`.
    fn levels(&self) -> u8 {
        self.inputs
            .iter()
            .enumerate()
            .filter(|(_, input)| input.is_high())
            .fold(0, |acc, (n, _)| acc | (1 << n))
    }

    /// Capture loop. Never returns.
    pub async fn run(mut self) -> ! {
        loop {
            let [a, b, c] = &mut self.inputs;
            select::select3(
                a.wait_for_any_edge(),
                b.wait_for_any_edge(),
                c.wait_for_any_edge(),
            )
            .await;
            let now = self.now();
            let levels = self.levels();
            self.capture.on_edge(levels, now, &SHARED.samples);
        }
    }
}

#[embassy_executor::task]
pub async fn capture_pulses(pulses: Pulses) {
    pulses.run().await
}
