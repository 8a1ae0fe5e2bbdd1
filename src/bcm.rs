//! # Binary-Coded Modulation Frame Scheduler
//!
//! Renders 8-bit brightness on all outputs with eight timer events per cycle
//! instead of 256. Plane `p` is held on the port for `2^p` counter ticks, so
//! the on-time of an output over a full cycle is proportional to its
//! brightness.
//!
//! ## Timer Layout
//!
//! The scheduler assumes an 8-bit free-running counter with one overflow
//! event and one reprogrammable compare-match event:
//!
//! ```text
//! counter:  0   1   3   7   15  31  63  127      256/0
//! event:    OVF CMP CMP CMP CMP CMP CMP CMP      OVF
//! plane:    0   1   2   3   4   5   6   7        0
//! ```
//!
//! Plane 0 is output on overflow; planes 1 to 7 are output on successive
//! compare matches, each reprogramming the compare register to the end of its
//! own slot. Plane 7 runs from 127 to the overflow, one tick longer than its
//! weight, which balances the cycle to exactly 256 ticks.
//!
//! Handlers only load a plane and compute a constant; they are safe to call
//! from the highest-priority interrupt.
use crate::{BitPlanes, PLANES};

/// Counter ticks in one full modulation cycle.
pub const CYCLE_TICKS: u16 = 256;

/// What the interrupt handler has to do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Bit-plane index that was output.
    pub plane: u8,
    /// Byte to write to the output port.
    pub port: u8,
    /// Next value for the compare-match register.
    pub compare: u8,
    /// Counter ticks until the next event.
    pub hold: u16,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    /// Plane to output on the next event; 0 means the overflow is next.
    plane: u8,
}

impl FrameScheduler {
    pub const fn new() -> Self {
        Self { plane: 0 }
    }

    /// Compare value at which `plane`'s slot ends.
    #[inline(always)]
    const fn slot_end(plane: u8) -> u8 {
        ((2u16 << plane) - 1) as u8
    }

    /// Overflow event: outputs plane 0 and arms the compare for plane 1.
    #[inline]
    pub fn on_overflow(&mut self, planes: &BitPlanes) -> Frame {
        self.plane = 1;
        Frame {
            plane: 0,
            port: planes.plane(0),
            compare: Self::slot_end(0),
            hold: 1,
        }
    }

    /// Compare-match event: outputs the next plane and moves the compare to
    /// the end of its slot.
    #[inline]
    pub fn on_compare_match(&mut self, planes: &BitPlanes) -> Frame {
        let plane = self.plane.max(1);
        let port = planes.plane(plane as usize);
        if plane as usize == PLANES - 1 {
            self.plane = 0;
            Frame {
                plane,
                port,
                compare: Self::slot_end(0),
                hold: CYCLE_TICKS - Self::slot_end(plane - 1) as u16,
            }
        } else {
            self.plane = plane + 1;
            Frame {
                plane,
                port,
                compare: Self::slot_end(plane),
                hold: 1 << plane,
            }
        }
    }

    /// Handles whichever event is due next. For drivers without a separate
    /// overflow interrupt that simply wait `hold` ticks between calls.
    #[inline]
    pub fn next(&mut self, planes: &BitPlanes) -> Frame {
        if self.plane == 0 {
            self.on_overflow(planes)
        } else {
            self.on_compare_match(planes)
        }
    }
}
