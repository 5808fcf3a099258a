//! Simulated planter board.
//!
//! Replaces the pile of one-off sensor-test scripts the hardware repo
//! would otherwise need: every capability the engine drives gets an
//! in-memory stand-in, so the whole loop runs on a workstation. Voltages
//! drift randomly inside their calibrated spans and the climate sensor
//! drops out now and then, which exercises the degraded paths too.

use rand::Rng;
use sprig_core::Peripherals;
use sprig_core::config::Config;
use sprig_core::error::{ActuatorError, DisplayError, SensorError};
use sprig_core::hal::{ClimateReading, ClimateSensor, MotionSensor, Panel, Switch, VoltageSensor};
use tracing::info;

/// An analog channel doing a bounded random walk.
struct DriftingVoltage {
    value: f64,
    jitter: f64,
    min: f64,
    max: f64,
}

impl DriftingVoltage {
    fn new(start: f64, jitter: f64, min: f64, max: f64) -> Self {
        Self {
            value: start,
            jitter,
            min,
            max,
        }
    }
}

impl VoltageSensor for DriftingVoltage {
    fn read_voltage(&mut self) -> Result<f64, SensorError> {
        let mut rng = rand::rng();
        let step = rng.random_range(-self.jitter..=self.jitter);
        self.value = (self.value + step).clamp(self.min, self.max);
        Ok(self.value)
    }
}

/// DHT-style sensor: usually answers, sometimes does not.
struct SimClimate;

impl ClimateSensor for SimClimate {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let mut rng = rand::rng();
        if rng.random_ratio(5, 100) {
            return Err(SensorError::Unavailable);
        }
        Ok(ClimateReading {
            temperature_c: rng.random_range(16.0..27.0),
            humidity_pct: rng.random_range(35.0..70.0),
        })
    }
}

struct SimMotion;

impl MotionSensor for SimMotion {
    fn motion_detected(&mut self) -> Result<bool, SensorError> {
        Ok(rand::rng().random_ratio(20, 100))
    }
}

/// GPIO output that just narrates what a relay would do.
struct LoggedSwitch {
    name: &'static str,
}

impl Switch for LoggedSwitch {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        info!(output = self.name, on, "Actuator write");
        Ok(())
    }
}

/// Stand-in for the ST7735 panel: seven visible lines, echoed to the log.
struct ConsolePanel;

impl Panel for ConsolePanel {
    fn visible_lines(&self) -> usize {
        7
    }

    fn render(&mut self, lines: &[String]) -> Result<(), DisplayError> {
        for line in lines {
            info!(panel = line, "Panel");
        }
        Ok(())
    }
}

/// Build a full board from the loaded calibration: dry soil, a tank at
/// roughly 80 %, ordinary room light. The dry probe makes the watering
/// path fire within the first cooldown.
pub fn simulated_board(config: &Config) -> Peripherals {
    let soil_span = (config.soil.high - config.soil.low).abs().max(1e-4);
    let water_span = (config.water.high - config.water.low).abs().max(1e-4);

    Peripherals {
        soil: Box::new(DriftingVoltage::new(
            config.soil.low - soil_span,
            soil_span / 10.0,
            0.0,
            config.soil.high,
        )),
        water: Box::new(DriftingVoltage::new(
            config.water.low + water_span * 0.8,
            water_span / 100.0,
            config.water.low,
            config.water.high,
        )),
        light: Some(Box::new(DriftingVoltage::new(1.2, 0.05, 0.0, 3.3))),
        climate: Box::new(SimClimate),
        motion: Some(Box::new(SimMotion)),
        pump: Box::new(LoggedSwitch { name: "pump-relay" }),
        backlight: Some(Box::new(LoggedSwitch { name: "backlight" })),
        panel: Some(Box::new(ConsolePanel)),
    }
}
