//! The control loop: read, derive, decide, log, render, sleep.
//!
//! One engine covers every board flavor; light, motion, backlight and
//! panel are optional capabilities rather than separate code paths. The
//! loop is single threaded and cooperatively blocking: sensor averaging
//! gaps and the watering burst hold are intentional synchronous waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::alertlog::AlertLog;
use crate::config::Config;
use crate::display::DisplayPresenter;
use crate::error::{EngineError, SensorError};
use crate::hal::{ClimateReading, ClimateSensor, Clock, MotionSensor, Panel, Switch, VoltageSensor};
use crate::sensing::{self, LightLevel};
use crate::watering::{BurstOutcome, WateringConfig, WateringController, WateringDecision};

/// Fixed delay between control cycles.
pub const CYCLE_DELAY: Duration = Duration::from_secs(3);

/// Everything the loop drives. Optional fields unify the boards that lack
/// a light sensor, a PIR, or a panel.
pub struct Peripherals {
    pub soil: Box<dyn VoltageSensor>,
    pub water: Box<dyn VoltageSensor>,
    pub light: Option<Box<dyn VoltageSensor>>,
    pub climate: Box<dyn ClimateSensor>,
    pub motion: Option<Box<dyn MotionSensor>>,
    pub pump: Box<dyn Switch>,
    pub backlight: Option<Box<dyn Switch>>,
    pub panel: Option<Box<dyn Panel>>,
}

/// What one cycle observed and did.
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    pub soil_percent: Option<u8>,
    pub water_percent: Option<u8>,
    pub lux: Option<f64>,
    pub light_level: Option<LightLevel>,
    pub climate: Option<ClimateReading>,
    pub motion: Option<bool>,
    pub watering: Option<WateringDecision>,
    pub burst: Option<BurstOutcome>,
    /// Status lines in arrival order, as offered to the panel.
    pub messages: Vec<String>,
}

pub struct Engine {
    config: Config,
    hw: Peripherals,
    clock: Box<dyn Clock>,
    alerts: AlertLog,
    waterer: WateringController,
    presenter: DisplayPresenter,
    recheck_water: bool,
    sample_count: usize,
}

impl Engine {
    pub fn new(config: Config, hw: Peripherals, clock: Box<dyn Clock>, alerts: AlertLog) -> Self {
        let waterer = WateringController::new(WateringConfig {
            wait_period: config.watering_wait_period,
            burst_duration: config.watering_duration,
        });
        Self {
            config,
            hw,
            clock,
            alerts,
            waterer,
            presenter: DisplayPresenter::new(),
            recheck_water: false,
            sample_count: sensing::SAMPLE_COUNT,
        }
    }

    /// Re-sample the reservoir right after each burst and alert if it ran
    /// out mid-watering. Off by default.
    pub fn with_water_recheck(mut self, on: bool) -> Self {
        self.recheck_water = on;
        self
    }

    /// Samples per averaged analog read.
    pub fn with_sample_count(mut self, samples: usize) -> Self {
        self.sample_count = samples;
        self
    }

    /// Run cycles until `stop` is set, then release the actuators.
    ///
    /// The cleanup contract holds on every exit path, fatal errors
    /// included: pump forced off first, then the backlight.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), EngineError> {
        if let Some(backlight) = self.hw.backlight.as_mut() {
            if let Err(e) = backlight.set(true) {
                self.shutdown();
                return Err(EngineError::Backlight(e));
            }
        }

        let result = loop {
            if stop.load(Ordering::Relaxed) {
                break Ok(());
            }
            match self.cycle() {
                Ok(report) => {
                    info!(messages = report.messages.len(), "Cycle complete");
                }
                Err(e) => break Err(e),
            }
            self.clock.sleep(CYCLE_DELAY);
        };

        self.shutdown();
        result
    }

    /// One full read-derive-actuate-render pass.
    pub fn cycle(&mut self) -> Result<CycleReport, EngineError> {
        let mut report = CycleReport::default();
        let mut messages: Vec<String> = Vec::new();

        self.read_analog_channels(&mut report, &mut messages);
        self.update_motion(&mut report, &mut messages)?;
        self.evaluate_climate(&mut report, &mut messages);
        self.run_watering(&mut report, &mut messages)?;

        if let Some(panel) = self.hw.panel.as_mut() {
            if let Err(error) = self.presenter.render(&messages, panel.as_mut()) {
                // Rendering is presentation only; a dead panel must not
                // stop irrigation.
                warn!(%error, "Panel render failed");
            }
        }

        report.messages = messages;
        Ok(report)
    }

    fn read_analog_channels(&mut self, report: &mut CycleReport, messages: &mut Vec<String>) {
        let clock = self.clock.as_ref();
        let samples = self.sample_count;

        match sensing::read_averaged(self.hw.soil.as_mut(), samples, clock) {
            Ok(voltage) => {
                let percent = sensing::soil_moisture_percent(&self.config, voltage);
                info!(voltage, percent, "Soil moisture");
                report.soil_percent = Some(percent);
            }
            Err(error) => {
                warn!(%error, "Soil sensor read error");
                messages.push("Soil sensor read error".to_owned());
            }
        }

        match sensing::read_averaged(self.hw.water.as_mut(), samples, clock) {
            Ok(voltage) => {
                let percent = sensing::water_level_percent(&self.config, voltage);
                info!(voltage, percent, "Water level");
                report.water_percent = Some(percent);
            }
            Err(error) => {
                warn!(%error, "Water sensor read error");
                messages.push("Water sensor read error".to_owned());
            }
        }

        if let Some(light) = self.hw.light.as_mut() {
            match sensing::read_averaged(light.as_mut(), samples, clock) {
                Ok(voltage) => {
                    let lux = sensing::lux_from_voltage(voltage);
                    let level = sensing::classify_light(lux, &self.config.light);
                    info!(voltage, lux, %level, "Ambient light");
                    messages.push(format!("Light level: {}", level.describe(lux)));
                    report.lux = Some(lux);
                    report.light_level = Some(level);
                }
                Err(error) => {
                    warn!(%error, "Light sensor read error");
                    messages.push("Light sensor read error".to_owned());
                }
            }
        }
    }

    fn update_motion(
        &mut self,
        report: &mut CycleReport,
        messages: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        let Some(motion_sensor) = self.hw.motion.as_mut() else {
            return Ok(());
        };
        let motion = match motion_sensor.motion_detected() {
            Ok(motion) => motion,
            Err(error) => {
                warn!(%error, "Motion sensor read error");
                messages.push("Motion sensor read error".to_owned());
                // No reading: treat as no motion so the idle timer keeps
                // counting instead of pinning the backlight on.
                false
            }
        };
        report.motion = Some(motion);

        let backlight = self.hw.backlight.as_deref_mut();
        self.presenter
            .update_backlight(motion, self.clock.now(), backlight)
            .map_err(EngineError::Backlight)
    }

    fn evaluate_climate(&mut self, report: &mut CycleReport, messages: &mut Vec<String>) {
        let reading = match self.hw.climate.read() {
            Ok(reading) => reading,
            Err(error) => {
                warn!(%error, "Climate sensor read error");
                messages.push("Climate sensor read error".to_owned());
                return;
            }
        };
        info!(
            temperature_c = reading.temperature_c,
            humidity_pct = reading.humidity_pct,
            "Climate"
        );
        report.climate = Some(reading);

        if reading.temperature_c < self.config.temp_low {
            self.alert(messages, "Too cold! Temperature below threshold.");
        } else if reading.temperature_c > self.config.temp_high {
            self.alert(messages, "Too hot! Temperature above threshold.");
        }

        if reading.humidity_pct > self.config.humidity_max {
            self.alert(messages, "Too much humidity! Above threshold.");
        }
    }

    fn run_watering(
        &mut self,
        report: &mut CycleReport,
        messages: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        let (Some(soil), Some(water)) = (report.soil_percent, report.water_percent) else {
            // A blind watering decision is worse than a skipped one: with
            // either reading absent, hold the pump off for this cycle.
            return self
                .waterer
                .force_off(self.hw.pump.as_mut())
                .map_err(EngineError::Pump);
        };

        let decision = self.waterer.decide(soil, water, self.clock.now());
        report.watering = Some(decision);

        match decision {
            WateringDecision::SoilMoist => {
                info!("Soil moisture sufficient");
                self.waterer
                    .force_off(self.hw.pump.as_mut())
                    .map_err(EngineError::Pump)?;
            }
            WateringDecision::TankEmpty => {
                self.alert(messages, "No water available! Fill the tank.");
                self.waterer
                    .force_off(self.hw.pump.as_mut())
                    .map_err(EngineError::Pump)?;
            }
            WateringDecision::CooldownWait { remaining } => {
                messages.push(format!(
                    "Waiting absorption ({} min left)...",
                    remaining.as_secs() / 60
                ));
            }
            WateringDecision::StartBurst => {
                self.alert(messages, "Soil dry and water available, starting watering");

                let Peripherals { water, pump, .. } = &mut self.hw;
                let clock = self.clock.as_ref();
                let samples = self.sample_count;
                let config = &self.config;

                let mut recheck_fn;
                let recheck: Option<&mut dyn FnMut() -> Result<u8, SensorError>> =
                    if self.recheck_water {
                        recheck_fn = || {
                            sensing::read_averaged(water.as_mut(), samples, clock)
                                .map(|v| sensing::water_level_percent(config, v))
                        };
                        Some(&mut recheck_fn)
                    } else {
                        None
                    };

                let outcome = self
                    .waterer
                    .run_burst(pump.as_mut(), clock, recheck)
                    .map_err(EngineError::Pump)?;
                report.burst = Some(outcome);

                match outcome {
                    BurstOutcome::Completed => {
                        self.persist_alert("Pump off, waiting absorption.");
                    }
                    BurstOutcome::TankExhausted => {
                        self.alert(messages, "Water ran out during watering! Fill the tank.");
                    }
                }
            }
        }
        Ok(())
    }

    /// Surface an alert on the panel and persist it. Persistence is best
    /// effort: a dead log file degrades, it does not stop the loop.
    fn alert(&self, messages: &mut Vec<String>, message: &str) {
        info!(alert = message, "Alert raised");
        messages.push(message.to_owned());
        self.persist_alert(message);
    }

    fn persist_alert(&self, message: &str) {
        if let Err(error) = self.alerts.append(message) {
            warn!(%error, "Failed to persist alert");
        }
    }

    fn shutdown(&mut self) {
        if let Err(error) = self.waterer.force_off(self.hw.pump.as_mut()) {
            error!(%error, "Failed to force pump off during shutdown");
        }
        if let Some(backlight) = self.hw.backlight.as_mut() {
            if let Err(error) = backlight.set(false) {
                error!(%error, "Failed to switch backlight off during shutdown");
            }
        }
        info!("Controller shut down");
    }
}
