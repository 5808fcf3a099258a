//! Unattended environmental control loop for a smart planter.
//!
//! The core is hardware free: concrete ADC, GPIO and panel drivers live
//! behind the capability traits in [`hal`], which real boards, the
//! simulator and tests all implement. One [`engine::Engine`] covers every
//! board flavor; optional peripherals are `Option`s, not code paths.

pub mod alertlog;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod hal;
pub mod sensing;
pub mod watering;

pub use alertlog::AlertLog;
pub use config::Config;
pub use engine::{CycleReport, Engine, Peripherals};
pub use hal::{ClimateReading, Clock, ManualClock, MonotonicClock};
