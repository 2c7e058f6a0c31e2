// Paired lift control for the lower lift arms
//
// Provides:
// - Potentiometer normalization (raw counts -> comparable positions)
// - Tolerance-gated leveling of the left/right arms
// - `LiftSynchronizer`, which binds both to a validated `LiftConfig`

pub mod sensor;
pub mod sync;

pub use sensor::{NormalizedPosition, SensorChannel, SensorChannelId, normalize};
pub use sync::{ActuatorCommand, ActuatorIntent, compute};

use crate::config::LiftConfig;
use crate::hal::{ActuatorSink, MotorId};

/// Raw potentiometer counts for both lift sides, read in the same tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiftReadings {
    pub left: i32,
    pub right: i32,
}

/// Runs the leveling law with the calibration from a `LiftConfig`
#[derive(Debug, Clone)]
pub struct LiftSynchronizer {
    config: LiftConfig,
}

impl LiftSynchronizer {
    pub fn new(config: LiftConfig) -> Self {
        Self { config }
    }

    /// Normalized (left, right) positions for a pair of raw readings
    pub fn positions(&self, readings: LiftReadings) -> (NormalizedPosition, NormalizedPosition) {
        let left = SensorChannel::new(readings.left, self.config.scale_factor_left, self.config.floor);
        let right =
            SensorChannel::new(readings.right, self.config.scale_factor_right, self.config.floor);
        (left.position(), right.position())
    }

    /// Command for one tick using the configured operator speeds
    pub fn command(&self, readings: LiftReadings, intent: ActuatorIntent) -> ActuatorCommand {
        self.command_with_speeds(
            readings,
            intent,
            self.config.raise_speed,
            self.config.lower_speed,
        )
    }

    /// Command for one tick with caller-supplied speeds (autonomous uses its own)
    pub fn command_with_speeds(
        &self,
        readings: LiftReadings,
        intent: ActuatorIntent,
        raise_speed: i16,
        lower_speed: i16,
    ) -> ActuatorCommand {
        let (left, right) = self.positions(readings);
        compute(left, right, intent, raise_speed, lower_speed, self.config.tolerance)
    }
}

/// Write a lift command to the two lower lift motors
pub fn apply(sink: &mut impl ActuatorSink, command: ActuatorCommand) {
    sink.set_speed(MotorId::LowerLiftLeft, command.left_speed);
    sink.set_speed(MotorId::LowerLiftRight, command.right_speed);
}
