//! # Pulse Capture
//!
//! Measures the active-high width of pulses on three inputs that share one
//! pin-change interrupt. The handler is handed the current input levels and
//! the free-running counter value; it keeps the start time of each pulse and,
//! on the falling edge, posts the width into a single-slot mailbox.
//!
//! ## Counter Wrap
//!
//! The counter runs from 0 to `wrap - 1` and then restarts. A pulse that
//! straddles the restart shows `now < start`, and the width is corrected by
//! adding the wrap period back.
//!
//! ## Mailbox
//!
//! One slot per input, last write wins. If the main loop is slow the older
//! sample is simply overwritten; nothing queues. No filtering happens here,
//! noise rejection is the consumer's job.
//!
//! ## Suspension
//!
//! While the mailbox is suspended (the CPU is about to stall, e.g. on a
//! flash erase) edges are still tracked but their timestamps cannot be
//! trusted. Pulses with an edge seen while suspended are dropped.
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::INPUTS;

/// Single-slot, last-write-wins handoff from capture to calibration.
pub struct SampleMailbox {
    slots: Mutex<CriticalSectionRawMutex, Cell<[Option<u16>; INPUTS]>>,
    suspended: AtomicBool,
}

impl SampleMailbox {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(Cell::new([None; INPUTS])),
            suspended: AtomicBool::new(false),
        }
    }

    /// Edge timestamps are unreliable until [`resume`](Self::resume).
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::SeqCst);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Publishes `width` for `input`, replacing any unconsumed sample.
    pub fn post(&self, input: usize, width: u16) {
        self.slots.lock(|slots| {
            let mut pending = slots.get();
            pending[input] = Some(width);
            slots.set(pending);
        });
    }

    /// Takes the pending sample for `input` and clears the slot.
    pub fn take(&self, input: usize) -> Option<u16> {
        self.slots.lock(|slots| {
            let mut pending = slots.get();
            let sample = pending[input].take();
            slots.set(pending);
            sample
        })
    }

    pub fn is_pending(&self, input: usize) -> bool {
        self.slots.lock(|slots| slots.get()[input].is_some())
    }
}

impl Default for SampleMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct PulseCapture {
    /// Input levels seen at the previous edge.
    last: u8,
    /// Counter value at each input's rising edge, if it can be trusted.
    start: [Option<u16>; INPUTS],
    /// Counter period: the counter counts `0..wrap`.
    wrap: u32,
}

impl PulseCapture {
    /// Capture for a counter that restarts after `wrap` ticks. Use
    /// `1 << 16` for a counter that wraps at its full width.
    pub const fn new(wrap: u32) -> Self {
        Self {
            last: 0,
            start: [None; INPUTS],
            wrap,
        }
    }

    /// Width of a pulse that started at `start` and ended at `now`.
    #[inline(always)]
    pub fn elapsed(&self, start: u16, now: u16) -> u16 {
        if now >= start {
            now - start
        } else {
            (u32::from(now) + self.wrap - u32::from(start)) as u16
        }
    }

    /// Pin-change event. `levels` holds the current input levels in bits
    /// 0 to 2; `now` is the free-running counter sampled with them.
    ///
    /// A falling edge without a trusted rising edge posts nothing.
    #[inline]
    pub fn on_edge(&mut self, levels: u8, now: u16, mailbox: &SampleMailbox) {
        let levels = levels & ((1 << INPUTS) - 1);
        let changed = self.last ^ levels;
        let suspended = mailbox.is_suspended();
        for input in 0..INPUTS {
            let mask = 1 << input;
            if changed & mask == 0 {
                continue;
            }
            if suspended {
                self.start[input] = None;
            } else if levels & mask != 0 {
                self.start[input] = Some(now);
            } else if let Some(start) = self.start[input].take() {
                mailbox.post(input, self.elapsed(start, now));
            }
        }
        self.last = levels;
    }
}
