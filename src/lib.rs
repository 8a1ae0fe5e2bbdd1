//! # LED Controller Core
//!
//! Real-time engine of a seven-output LED controller. Brightness is rendered
//! with binary-coded modulation, animated against a fixed tick, and can be
//! slaved to three RC-style pulse inputs that calibrate themselves at runtime.
//!
//! ## Contexts
//!
//! - **Interrupt context**: [`FrameScheduler`], [`TickCounters::on_tick`] and
//!   [`PulseCapture::on_edge`]. Short, bounded, never blocking.
//! - **Main loop**: [`Engine`] drains pending samples through the
//!   [`Calibrator`], persists moved bounds through [`Settings`], and animates
//!   every output into the shared [`BitPlanes`].
//!
//! Everything the two contexts share lives in [`Shared`], which is meant to
//! sit in a `static`.
#![no_std]

pub mod animation;
pub mod bcm;
pub mod calibrate;
pub mod capture;
pub mod engine;
pub mod flash;
pub mod gamma;
pub mod menu;
pub mod planes;
pub mod settings;
pub mod state;
pub mod tick;

pub use animation::{AnimationMode, BrightnessSource, ChannelConfig, PeriodSource};
pub use bcm::{Frame, FrameScheduler};
pub use calibrate::{Calibrator, InputChannel, Mode, Update};
pub use capture::{PulseCapture, SampleMailbox};
pub use engine::Engine;
pub use flash::FlashStore;
pub use gamma::Gamma;
pub use menu::{Menu, MenuEvent, SettingChange};
pub use planes::BitPlanes;
pub use settings::{Bounds, Settings, Storage};
pub use state::Shared;
pub use tick::TickCounters;

/// Number of LED outputs.
pub const OUTPUTS: usize = 7;
/// Number of pulse-width inputs.
pub const INPUTS: usize = 3;
/// Number of bit-planes, one per bit of brightness.
pub const PLANES: usize = 8;
