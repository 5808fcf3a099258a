//! Flat `KEY=VALUE` configuration shared with the external web editor.
//!
//! The file format is deliberately dumb: one pair per line, blank lines and
//! lines without `=` ignored. The editor rewrites the same file between
//! runs; the loop loads it once at startup and treats it as read-only for
//! the rest of the process. Parsing is eager and strict: a missing or
//! non-numeric key is fatal, because the loop must not run with undefined
//! thresholds.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// A voltage pair mapping onto 0 % (`low`) and 100 % (`high`).
///
/// The percent mapping clamps, so an inverted pair (low >= high) degrades
/// to a step function rather than crashing; it is not a load error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightThresholds {
    pub dark: f64,
    pub low_min: f64,
    pub low_max: f64,
    pub ideal_min: f64,
    pub ideal_max: f64,
    pub too_much: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub soil: Calibration,
    pub water: Calibration,
    pub temp_low: f64,
    pub temp_high: f64,
    pub humidity_max: f64,
    pub light: LightThresholds,
    pub watering_wait_period: Duration,
    pub watering_duration: Duration,
    /// Keys we do not interpret, kept in file order so a save round-trips
    /// everything the external editor may have added.
    extras: Vec<(String, String)>,
}

fn take_number(pairs: &mut Vec<(String, String)>, key: &'static str) -> Result<f64, ConfigError> {
    let idx = pairs
        .iter()
        .position(|(k, _)| k == key)
        .ok_or(ConfigError::MissingKey(key))?;
    let (_, value) = pairs.remove(idx);
    value
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

fn take_seconds(pairs: &mut Vec<(String, String)>, key: &'static str) -> Result<Duration, ConfigError> {
    let secs = take_number(pairs, key)?;
    if secs < 0.0 {
        return Err(ConfigError::NegativeValue { key, value: secs });
    }
    Ok(Duration::from_secs_f64(secs))
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            pairs.push((key.trim().to_owned(), value.trim().to_owned()));
        }

        let config = Config {
            soil: Calibration {
                low: take_number(&mut pairs, "SOIL_DRY_VOLTAGE")?,
                high: take_number(&mut pairs, "SOIL_WET_VOLTAGE")?,
            },
            water: Calibration {
                low: take_number(&mut pairs, "WATER_EMPTY_VOLTAGE")?,
                high: take_number(&mut pairs, "WATER_FULL_VOLTAGE")?,
            },
            temp_low: take_number(&mut pairs, "TEMP_THRESHOLDS_low")?,
            temp_high: take_number(&mut pairs, "TEMP_THRESHOLDS_high")?,
            humidity_max: take_number(&mut pairs, "HUMIDITY_THRESHOLD")?,
            light: LightThresholds {
                dark: take_number(&mut pairs, "LIGHT_THRESHOLDS_dark")?,
                low_min: take_number(&mut pairs, "LIGHT_THRESHOLDS_low_min")?,
                low_max: take_number(&mut pairs, "LIGHT_THRESHOLDS_low_max")?,
                ideal_min: take_number(&mut pairs, "LIGHT_THRESHOLDS_ideal_min")?,
                ideal_max: take_number(&mut pairs, "LIGHT_THRESHOLDS_ideal_max")?,
                too_much: take_number(&mut pairs, "LIGHT_THRESHOLDS_too_much")?,
            },
            watering_wait_period: take_seconds(&mut pairs, "watering_wait_period")?,
            watering_duration: take_seconds(&mut pairs, "watering_duration")?,
            extras: pairs,
        };
        Ok(config)
    }

    /// Serialize every known key (then the preserved extras) back into the
    /// `KEY=VALUE` format, overwriting the file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_file_string()).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        let mut line = |key: &str, value: f64| {
            let _ = writeln!(out, "{key}={value}");
        };
        line("SOIL_DRY_VOLTAGE", self.soil.low);
        line("SOIL_WET_VOLTAGE", self.soil.high);
        line("WATER_EMPTY_VOLTAGE", self.water.low);
        line("WATER_FULL_VOLTAGE", self.water.high);
        line("TEMP_THRESHOLDS_low", self.temp_low);
        line("TEMP_THRESHOLDS_high", self.temp_high);
        line("HUMIDITY_THRESHOLD", self.humidity_max);
        line("LIGHT_THRESHOLDS_dark", self.light.dark);
        line("LIGHT_THRESHOLDS_low_min", self.light.low_min);
        line("LIGHT_THRESHOLDS_low_max", self.light.low_max);
        line("LIGHT_THRESHOLDS_ideal_min", self.light.ideal_min);
        line("LIGHT_THRESHOLDS_ideal_max", self.light.ideal_max);
        line("LIGHT_THRESHOLDS_too_much", self.light.too_much);
        line("watering_wait_period", self.watering_wait_period.as_secs_f64());
        line("watering_duration", self.watering_duration.as_secs_f64());
        for (key, value) in &self.extras {
            let _ = writeln!(out, "{key}={value}");
        }
        out
    }
}

impl Default for Config {
    /// The calibration and thresholds the reference planter shipped with.
    fn default() -> Self {
        Self {
            soil: Calibration {
                low: 3.8378,
                high: 3.8403,
            },
            water: Calibration {
                low: 2.4000,
                high: 2.9000,
            },
            temp_low: 18.0,
            temp_high: 24.0,
            humidity_max: 60.0,
            light: LightThresholds {
                dark: 10.0,
                low_min: 300.0,
                low_max: 500.0,
                ideal_min: 1000.0,
                ideal_max: 5000.0,
                too_much: 5000.0,
            },
            watering_wait_period: Duration::from_secs(300),
            watering_duration: Duration::from_secs(5),
            extras: Vec::new(),
        }
    }
}
