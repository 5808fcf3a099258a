//! Debounced watering state machine.
//!
//! The pump runs in fixed-duration bursts with a cooldown between them so
//! the soil has time to absorb before the probe is trusted again. The
//! burst hold is a deliberate synchronous wait: the loop is single
//! threaded and nothing else is serviced while the pump is energized.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ActuatorError, SensorError};
use crate::hal::{Clock, Switch};

#[derive(Debug, Clone, Copy)]
pub struct WateringConfig {
    /// Minimum elapsed time between burst starts (absorption period).
    pub wait_period: Duration,
    /// How long the pump stays energized per burst.
    pub burst_duration: Duration,
}

/// In-memory only; a restart forgets the last watering on purpose (the
/// first cycle after boot may water immediately).
#[derive(Debug, Clone, Copy, Default)]
pub struct WateringState {
    /// Monotonic time of the last burst start.
    pub last_watering: Option<Duration>,
    pub pump_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WateringDecision {
    /// Soil reads above 0 %; pump stays off regardless of anything else.
    SoilMoist,
    /// Soil is dry but the reservoir reads empty; alert, pump off.
    TankEmpty,
    /// Soil is dry, water available, but the cooldown has not elapsed.
    CooldownWait { remaining: Duration },
    /// Soil is dry, water available, cooldown elapsed: run a burst.
    StartBurst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    Completed,
    /// The post-hold re-check read an empty reservoir.
    TankExhausted,
}

pub struct WateringController {
    config: WateringConfig,
    state: WateringState,
}

impl WateringController {
    pub fn new(config: WateringConfig) -> Self {
        Self {
            config,
            state: WateringState::default(),
        }
    }

    pub fn state(&self) -> WateringState {
        self.state
    }

    /// Pure decision, no actuation. Soil sufficiency always wins over any
    /// pending cooldown bookkeeping; a "just watered but still dry" next
    /// cycle re-enters the cooldown wait instead of re-triggering.
    pub fn decide(&self, soil_pct: u8, water_pct: u8, now: Duration) -> WateringDecision {
        if soil_pct > 0 {
            return WateringDecision::SoilMoist;
        }
        if water_pct == 0 {
            return WateringDecision::TankEmpty;
        }
        match self.state.last_watering {
            None => WateringDecision::StartBurst,
            Some(last) => {
                let elapsed = now.saturating_sub(last);
                if elapsed >= self.config.wait_period {
                    WateringDecision::StartBurst
                } else {
                    WateringDecision::CooldownWait {
                        remaining: self.config.wait_period - elapsed,
                    }
                }
            }
        }
    }

    /// Energize the pump, hold for the burst duration, then de-energize.
    ///
    /// When `recheck` is supplied, the reservoir is re-sampled after the
    /// hold; an empty reading is reported as [`BurstOutcome::TankExhausted`]
    /// so the caller can alert. A failed re-check is only logged; the
    /// burst still completes and the pump still goes off.
    pub fn run_burst(
        &mut self,
        pump: &mut dyn Switch,
        clock: &dyn Clock,
        recheck: Option<&mut dyn FnMut() -> Result<u8, SensorError>>,
    ) -> Result<BurstOutcome, ActuatorError> {
        let started = clock.now();
        pump.set(true)?;
        self.state.pump_on = true;
        info!(burst_secs = self.config.burst_duration.as_secs_f64(), "Pump on");

        clock.sleep(self.config.burst_duration);

        let outcome = match recheck {
            None => BurstOutcome::Completed,
            Some(read_water) => match read_water() {
                Ok(0) => BurstOutcome::TankExhausted,
                Ok(_) => BurstOutcome::Completed,
                Err(error) => {
                    warn!(%error, "Water re-check failed after burst");
                    BurstOutcome::Completed
                }
            },
        };

        pump.set(false)?;
        self.state.pump_on = false;
        self.state.last_watering = Some(started);
        info!("Pump off");
        Ok(outcome)
    }

    /// Force the pump off without touching the cooldown timer.
    pub fn force_off(&mut self, pump: &mut dyn Switch) -> Result<(), ActuatorError> {
        pump.set(false)?;
        self.state.pump_on = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::ManualClock;

    const CONFIG: WateringConfig = WateringConfig {
        wait_period: Duration::from_secs(300),
        burst_duration: Duration::from_secs(5),
    };

    #[derive(Default)]
    struct RecordingSwitch {
        commands: Vec<bool>,
    }

    impl Switch for RecordingSwitch {
        fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
            self.commands.push(on);
            Ok(())
        }
    }

    #[test]
    fn moist_soil_never_waters() {
        let controller = WateringController::new(CONFIG);
        for water in [0, 1, 50, 100] {
            for secs in [0, 299, 300, 100_000] {
                let decision = controller.decide(1, water, Duration::from_secs(secs));
                assert_eq!(decision, WateringDecision::SoilMoist);
            }
        }
    }

    #[test]
    fn dry_soil_with_empty_tank_alerts_without_touching_cooldown() {
        let mut controller = WateringController::new(CONFIG);
        let mut pump = RecordingSwitch::default();
        let decision = controller.decide(0, 0, Duration::from_secs(10));
        assert_eq!(decision, WateringDecision::TankEmpty);
        controller.force_off(&mut pump).unwrap();
        assert_eq!(pump.commands, vec![false]);
        assert!(controller.state().last_watering.is_none());
    }

    #[test]
    fn first_burst_runs_immediately_after_boot() {
        let controller = WateringController::new(CONFIG);
        assert_eq!(
            controller.decide(0, 80, Duration::ZERO),
            WateringDecision::StartBurst
        );
    }

    #[test]
    fn burst_energizes_holds_and_releases() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(400));
        let mut controller = WateringController::new(CONFIG);
        let mut pump = RecordingSwitch::default();

        let outcome = controller.run_burst(&mut pump, &clock, None).unwrap();
        assert_eq!(outcome, BurstOutcome::Completed);
        assert_eq!(pump.commands, vec![true, false]);
        // The hold consumed exactly the burst duration on the clock.
        assert_eq!(clock.now(), Duration::from_secs(405));
        // Cooldown anchors at the burst start, not its end.
        assert_eq!(
            controller.state().last_watering,
            Some(Duration::from_secs(400))
        );
        assert!(!controller.state().pump_on);
    }

    #[test]
    fn no_retrigger_within_cooldown_even_with_unchanged_readings() {
        let clock = ManualClock::new();
        let mut controller = WateringController::new(CONFIG);
        let mut pump = RecordingSwitch::default();
        controller.run_burst(&mut pump, &clock, None).unwrap();

        // Next cycle, still dry, still watered: must wait, not re-trigger.
        let now = clock.now();
        match controller.decide(0, 80, now) {
            WateringDecision::CooldownWait { remaining } => {
                assert_eq!(remaining, Duration::from_secs(295));
            }
            other => panic!("expected CooldownWait, got {other:?}"),
        }

        clock.advance(Duration::from_secs(294));
        assert!(matches!(
            controller.decide(0, 80, clock.now()),
            WateringDecision::CooldownWait { .. }
        ));

        clock.advance(Duration::from_secs(1));
        assert_eq!(
            controller.decide(0, 80, clock.now()),
            WateringDecision::StartBurst
        );
    }

    #[test]
    fn recheck_reports_exhausted_tank_and_still_releases_pump() {
        let clock = ManualClock::new();
        let mut controller = WateringController::new(CONFIG);
        let mut pump = RecordingSwitch::default();
        let mut empty = || Ok::<u8, SensorError>(0);

        let outcome = controller
            .run_burst(&mut pump, &clock, Some(&mut empty))
            .unwrap();
        assert_eq!(outcome, BurstOutcome::TankExhausted);
        assert_eq!(pump.commands, vec![true, false]);
    }

    #[test]
    fn failed_recheck_degrades_to_completed() {
        let clock = ManualClock::new();
        let mut controller = WateringController::new(CONFIG);
        let mut pump = RecordingSwitch::default();
        let mut broken = || Err::<u8, SensorError>(SensorError::Unavailable);

        let outcome = controller
            .run_burst(&mut pump, &clock, Some(&mut broken))
            .unwrap();
        assert_eq!(outcome, BurstOutcome::Completed);
        assert_eq!(pump.commands, vec![true, false]);
    }
}
