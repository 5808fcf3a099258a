use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A sensor read that produced no usable value.
///
/// Sensor failures are never fatal: the affected reading is treated as
/// absent for the cycle and the loop keeps going.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The capability reported "no reading" (e.g. a DHT-style sensor that
    /// simply failed to answer this time).
    #[error("sensor reported no reading")]
    Unavailable,
    /// The channel itself is broken (disconnected probe, bus fault).
    #[error("sensor channel fault: {0}")]
    Channel(String),
}

/// A failed hardware write to the pump or backlight output.
///
/// Actuator failures are fatal: without actuation guarantees the loop
/// cannot water or release safely, so it stops after forcing everything off.
#[derive(Debug, Error)]
#[error("actuator write failed: {0}")]
pub struct ActuatorError(pub String);

/// A failed render to the status panel.
#[derive(Debug, Error)]
#[error("panel render failed: {0}")]
pub struct DisplayError(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("missing configuration key {0}")]
    MissingKey(&'static str),
    #[error("configuration key {key} has non-numeric value {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("configuration key {key} must not be negative, got {value}")]
    NegativeValue { key: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The only errors that abort the control loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pump control failed")]
    Pump(#[source] ActuatorError),
    #[error("backlight control failed")]
    Backlight(#[source] ActuatorError),
}
