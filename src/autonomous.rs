// Timed autonomous routine
//
// A list of steps, each holding its motor outputs for a fixed duration.
// Driven by the runtime tick instead of sleeping, so the watchdog and sensor
// intake keep running while it plays.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AutonomousConfig;
use crate::drive::{DriveButton, DriveSpeeds, apply_drive, button_speeds};
use crate::hal::ActuatorSink;
use crate::lift::{self, ActuatorCommand, ActuatorIntent, LiftReadings, LiftSynchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutonomousStep {
    Drive { speed: i16, duration_ms: u64 },
    SpinLeft { duration_ms: u64 },
    SpinRight { duration_ms: u64 },
    /// Spin right when starting on the right side, left otherwise
    SpinTowardStart { duration_ms: u64 },
    RaiseLift { duration_ms: u64 },
    LowerLift { duration_ms: u64 },
    Wait { duration_ms: u64 },
}

impl AutonomousStep {
    pub fn duration(&self) -> Duration {
        let ms = match *self {
            AutonomousStep::Drive { duration_ms, .. }
            | AutonomousStep::SpinLeft { duration_ms }
            | AutonomousStep::SpinRight { duration_ms }
            | AutonomousStep::SpinTowardStart { duration_ms }
            | AutonomousStep::RaiseLift { duration_ms }
            | AutonomousStep::LowerLift { duration_ms }
            | AutonomousStep::Wait { duration_ms } => duration_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Which side of the bar the robot starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSide {
    Left,
    Right,
}

impl StartSide {
    /// A pressed limit switch means the left side; no switch means right
    pub fn from_limit_switch(pressed: Option<bool>) -> Self {
        match pressed {
            Some(true) => StartSide::Left,
            _ => StartSide::Right,
        }
    }
}

pub struct AutonomousRoutine {
    steps: Vec<AutonomousStep>,
    side: StartSide,
    drive_speed: i16,
    lift_raise_speed: i16,
    lift_lower_speed: i16,
    current: usize,
    step_started: Instant,
}

impl AutonomousRoutine {
    pub fn new(config: &AutonomousConfig, drive_speed: i16, side: StartSide, now: Instant) -> Self {
        info!(
            "Starting autonomous routine: {} steps, {:?} side",
            config.steps.len(),
            side
        );
        Self {
            steps: config.steps.clone(),
            side,
            drive_speed,
            lift_raise_speed: config.lift_raise_speed,
            lift_lower_speed: config.lift_lower_speed,
            current: 0,
            step_started: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.steps.len()
    }

    pub fn current_step(&self) -> Option<&AutonomousStep> {
        self.steps.get(self.current)
    }

    /// Write this tick's outputs into `sink`. Returns false once the routine is done.
    ///
    /// `sink` is expected to start the tick with every motor stopped; only the
    /// motors the current step uses are set.
    pub fn tick(
        &mut self,
        now: Instant,
        sink: &mut impl ActuatorSink,
        lift: &LiftSynchronizer,
        readings: Option<LiftReadings>,
    ) -> bool {
        // Step boundaries advance by the step's own duration so a late tick
        // doesn't stretch the rest of the routine.
        while let Some(step) = self.steps.get(self.current) {
            let duration = step.duration();
            if now.saturating_duration_since(self.step_started) < duration {
                break;
            }
            self.step_started += duration;
            self.current += 1;
            if let Some(next) = self.steps.get(self.current) {
                info!("Autonomous step {}: {:?}", self.current, next);
            }
        }

        let Some(&step) = self.steps.get(self.current) else {
            info!("Autonomous routine finished");
            sink.stop_all();
            return false;
        };

        match step {
            AutonomousStep::Drive { speed, .. } => {
                apply_drive(sink, DriveSpeeds::new(speed, speed));
            }
            AutonomousStep::SpinLeft { .. } => self.spin(sink, DriveButton::SpinLeft),
            AutonomousStep::SpinRight { .. } => self.spin(sink, DriveButton::SpinRight),
            AutonomousStep::SpinTowardStart { .. } => {
                let button = match self.side {
                    StartSide::Right => DriveButton::SpinRight,
                    StartSide::Left => DriveButton::SpinLeft,
                };
                self.spin(sink, button);
            }
            AutonomousStep::RaiseLift { .. } => {
                self.lift(sink, lift, readings, ActuatorIntent::Raise)
            }
            AutonomousStep::LowerLift { .. } => {
                self.lift(sink, lift, readings, ActuatorIntent::Lower)
            }
            AutonomousStep::Wait { .. } => {}
        }
        true
    }

    fn spin(&self, sink: &mut impl ActuatorSink, button: DriveButton) {
        apply_drive(sink, button_speeds(Some(button), self.drive_speed));
    }

    fn lift(
        &self,
        sink: &mut impl ActuatorSink,
        lift: &LiftSynchronizer,
        readings: Option<LiftReadings>,
        intent: ActuatorIntent,
    ) {
        // Without pot readings the arms can't be kept level, so they stay put
        let command = match readings {
            Some(readings) => lift.command_with_speeds(
                readings,
                intent,
                self.lift_raise_speed,
                self.lift_lower_speed,
            ),
            None => ActuatorCommand::stop(),
        };
        lift::apply(sink, command);
    }
}
