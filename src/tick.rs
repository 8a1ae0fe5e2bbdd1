//! Tick source: one free-running 16-bit counter per output.
//!
//! The timer interrupt is the only incrementer. Everyone else reads, rewinds
//! or (the setup menu) resets. Counters wrap naturally at 2^16.
use core::sync::atomic::{AtomicU16, Ordering};

use crate::OUTPUTS;

/// Real-time length of one tick.
pub const TICK_PERIOD_US: u64 = 6_250;

pub struct TickCounters {
    counters: [AtomicU16; OUTPUTS],
}

impl TickCounters {
    pub const fn new() -> Self {
        Self {
            counters: [const { AtomicU16::new(0) }; OUTPUTS],
        }
    }

    /// Timer event. Advances every counter by one.
    #[inline(always)]
    pub fn on_tick(&self) {
        for counter in &self.counters {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn get(&self, output: usize) -> u16 {
        self.counters[output].load(Ordering::Relaxed)
    }

    /// Subtracts `by` from the counter, keeping any overrun past `by`.
    /// Clamps at zero instead of wrapping. Returns the new value.
    pub fn rewind(&self, output: usize, by: u32) -> u16 {
        let by = u16::try_from(by).unwrap_or(u16::MAX);
        let previous = self.counters[output]
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| {
                Some(t.saturating_sub(by))
            })
            .unwrap_or_else(|t| t);
        previous.saturating_sub(by)
    }

    pub fn reset(&self, output: usize) {
        self.counters[output].store(0, Ordering::Relaxed);
    }

    pub fn reset_all(&self) {
        for counter in &self.counters {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TickCounters {
    fn default() -> Self {
        Self::new()
    }
}
