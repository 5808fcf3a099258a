//! Capability ports for the planter hardware.
//!
//! The control loop consumes these narrow traits without knowing the
//! concrete drivers behind them. Real boards wire up ADC channels, GPIO
//! pins and a TFT; tests and the simulator supply in-memory stand-ins.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::{ActuatorError, DisplayError, SensorError};

/// One temperature + relative-humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// An analog channel that yields an instantaneous voltage.
pub trait VoltageSensor {
    fn read_voltage(&mut self) -> Result<f64, SensorError>;
}

/// A combined temperature/humidity capability that either answers with a
/// full reading or reports that none is available right now.
pub trait ClimateSensor {
    fn read(&mut self) -> Result<ClimateReading, SensorError>;
}

/// A digital motion detector (PIR or similar).
pub trait MotionSensor {
    fn motion_detected(&mut self) -> Result<bool, SensorError>;
}

/// A binary output: pump relay, backlight pin.
pub trait Switch {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError>;
}

/// A bounded text panel. Rendering replaces the whole visible content.
pub trait Panel {
    /// How many text lines fit vertically.
    fn visible_lines(&self) -> usize;
    fn render(&mut self, lines: &[String]) -> Result<(), DisplayError>;
}

/// Monotonic time source and the only sleep primitive the core may use.
///
/// Every wait in the loop (sensor averaging gaps, the watering burst hold,
/// the inter-cycle delay) goes through this trait, so tests drive the loop
/// with a [`ManualClock`] instead of real delays.
pub trait Clock {
    /// Monotonic time since an arbitrary origin (process start in practice).
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by [`Instant`]; sleeps block the thread for real.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock whose time only moves when something sleeps on it or the test
/// advances it by hand. Keeps timing-sensitive tests instant and exact.
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
