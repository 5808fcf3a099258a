//! Raw-voltage acquisition and derivation of calibrated readings.
//!
//! Analog channels are noisy, so every read is the arithmetic mean of a
//! short sample window. Derived percentages truncate toward zero; the
//! calibration pipeline downstream (and the historical alert logs) depend
//! on that exact behavior, so do not "fix" it to round-to-nearest.

use std::fmt;
use std::time::Duration;

use crate::config::{Calibration, Config, LightThresholds};
use crate::error::SensorError;
use crate::hal::{Clock, VoltageSensor};

/// Default number of instantaneous samples per averaged read.
pub const SAMPLE_COUNT: usize = 10;

/// Gap between consecutive samples within one averaged read.
pub const SAMPLE_DELAY: Duration = Duration::from_millis(10);

/// Read `samples` instantaneous voltages with a fixed inter-sample delay
/// and return their mean. A single failed sample fails the whole read; a
/// partial average would silently misreport the channel.
pub fn read_averaged(
    sensor: &mut dyn VoltageSensor,
    samples: usize,
    clock: &dyn Clock,
) -> Result<f64, SensorError> {
    let mut total = 0.0;
    for _ in 0..samples {
        total += sensor.read_voltage()?;
        clock.sleep(SAMPLE_DELAY);
    }
    Ok(total / samples as f64)
}

/// Linear interpolation of a voltage between the calibration endpoints,
/// clamped to 0..=100 and truncated to an integer percent.
///
/// The low endpoint is checked first, so an inverted pair (low >= high)
/// degrades to a 0/100 step function and never divides by a non-positive
/// span.
pub fn level_percent(voltage: f64, cal: &Calibration) -> u8 {
    if voltage <= cal.low {
        0
    } else if voltage >= cal.high {
        100
    } else {
        ((voltage - cal.low) / (cal.high - cal.low) * 100.0) as u8
    }
}

pub fn soil_moisture_percent(config: &Config, voltage: f64) -> u8 {
    level_percent(voltage, &config.soil)
}

pub fn water_level_percent(config: &Config, voltage: f64) -> u8 {
    level_percent(voltage, &config.water)
}

/// TEMT6000 behind a 10 K pull-down: roughly 1 V per 1000 lux.
pub fn lux_from_voltage(voltage: f64) -> f64 {
    voltage * 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightLevel {
    Dark,
    Low,
    Ideal,
    TooMuch,
    Moderate,
}

/// Map a lux value onto the five light bands.
///
/// Branch order is part of the contract: dark wins outright, the two
/// inclusive ranges are tried next, too-much only if nothing else matched,
/// moderate is the fallback. Overlapping thresholds in a misconfigured
/// file resolve to the first matching branch.
pub fn classify_light(lux: f64, thresholds: &LightThresholds) -> LightLevel {
    if lux < thresholds.dark {
        LightLevel::Dark
    } else if thresholds.low_min <= lux && lux <= thresholds.low_max {
        LightLevel::Low
    } else if thresholds.ideal_min <= lux && lux <= thresholds.ideal_max {
        LightLevel::Ideal
    } else if lux > thresholds.too_much {
        LightLevel::TooMuch
    } else {
        LightLevel::Moderate
    }
}

impl LightLevel {
    /// Human-readable status line for the panel and the console.
    pub fn describe(self, lux: f64) -> String {
        match self {
            LightLevel::Dark => format!("Dark room ({lux:.0} lx)"),
            LightLevel::Low => format!("Low light ({lux:.0} lx)"),
            LightLevel::Ideal => format!("Ideal light ({lux:.0} lx)"),
            LightLevel::TooMuch => format!("Too much light ({lux:.0} lx)"),
            LightLevel::Moderate => format!("Moderate light ({lux:.0} lx)"),
        }
    }
}

impl fmt::Display for LightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightLevel::Dark => "dark",
            LightLevel::Low => "low",
            LightLevel::Ideal => "ideal",
            LightLevel::TooMuch => "too-much",
            LightLevel::Moderate => "moderate",
        };
        f.write_str(name)
    }
}
