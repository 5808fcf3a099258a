//! Status panel presentation and motion-gated backlight.

use std::time::Duration;

use crate::error::{ActuatorError, DisplayError};
use crate::hal::{Panel, Switch};

/// Backlight switches off after this long without detected motion.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy)]
pub struct DisplayState {
    /// Monotonic time of the last detected motion. `None` means no motion
    /// since start; the idle window then counts from process start.
    pub last_motion: Option<Duration>,
    pub backlight_on: bool,
}

pub struct DisplayPresenter {
    idle_timeout: Duration,
    state: DisplayState,
}

impl DisplayPresenter {
    /// The panel powers up with the backlight on.
    pub fn new() -> Self {
        Self {
            idle_timeout: IDLE_TIMEOUT,
            state: DisplayState {
                last_motion: None,
                backlight_on: true,
            },
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Update the backlight from motion recency. The actuator is written
    /// only on transitions, so the off command fires exactly once per idle
    /// expiry instead of every cycle.
    pub fn update_backlight(
        &mut self,
        motion: bool,
        now: Duration,
        backlight: Option<&mut (dyn Switch + 'static)>,
    ) -> Result<(), ActuatorError> {
        if motion {
            self.state.last_motion = Some(now);
            if !self.state.backlight_on {
                if let Some(switch) = backlight {
                    switch.set(true)?;
                }
                self.state.backlight_on = true;
            }
        } else if self.state.backlight_on {
            let idle = match self.state.last_motion {
                Some(last) => now.saturating_sub(last),
                None => now,
            };
            if idle > self.idle_timeout {
                if let Some(switch) = backlight {
                    switch.set(false)?;
                }
                self.state.backlight_on = false;
            }
        }
        Ok(())
    }

    /// Render the newest messages that fit the panel, oldest dropped
    /// first, preserving arrival order. Does nothing while the backlight
    /// is off.
    pub fn render(&self, messages: &[String], panel: &mut dyn Panel) -> Result<(), DisplayError> {
        if !self.state.backlight_on {
            return Ok(());
        }
        let start = messages.len().saturating_sub(panel.visible_lines());
        panel.render(&messages[start..])
    }
}

impl Default for DisplayPresenter {
    fn default() -> Self {
        Self::new()
    }
}
