//! State shared between interrupt handlers and the main loop.
use crate::{BitPlanes, SampleMailbox, TickCounters};

/// Written by the main loop, read by the frame scheduler: `planes`.
/// Incremented by the tick timer, read and rewound by the main loop: `ticks`.
/// Posted by pulse capture, taken by the main loop: `samples`.
pub struct Shared {
    pub planes: BitPlanes,
    pub ticks: TickCounters,
    pub samples: SampleMailbox,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            planes: BitPlanes::new(),
            ticks: TickCounters::new(),
            samples: SampleMailbox::new(),
        }
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}
