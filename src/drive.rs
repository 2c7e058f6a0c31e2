// Operator input -> open-loop motor speeds
//
// Everything here is direct pass-through: tank drive from the sticks or the
// D-pad, plus the claw and upper lift which have no position feedback.

use serde::{Deserialize, Serialize};

use crate::config::{ClawConfig, DriveConfig, OpenLoopConfig};
use crate::hal::{ActuatorSink, MotorId};
use crate::lift::ActuatorIntent;

/// D-pad drive buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveButton {
    Forward,
    Backward,
    SpinLeft,
    SpinRight,
}

/// Raw drive input for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveInput {
    /// Left stick vertical axis, -127..=127
    pub left_stick: i16,
    /// Right stick vertical axis, -127..=127
    pub right_stick: i16,
    pub button: Option<DriveButton>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClawIntent {
    Close,
    Open,
    #[default]
    Hold,
}

/// Left/right drive speeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSpeeds {
    pub left: i16,
    pub right: i16,
}

impl DriveSpeeds {
    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Zero out stick noise near center
pub fn apply_deadband(value: i16, threshold: i16) -> i16 {
    if value.unsigned_abs() > threshold.unsigned_abs() {
        value
    } else {
        0
    }
}

pub fn button_speeds(button: Option<DriveButton>, speed: i16) -> DriveSpeeds {
    match button {
        Some(DriveButton::Forward) => DriveSpeeds::new(speed, speed),
        Some(DriveButton::Backward) => DriveSpeeds::new(-speed, -speed),
        Some(DriveButton::SpinRight) => DriveSpeeds::new(speed, -speed),
        Some(DriveButton::SpinLeft) => DriveSpeeds::new(-speed, speed),
        None => DriveSpeeds::default(),
    }
}

/// Buttons first, then the sticks override whenever either is outside the deadband
pub fn drive_speeds(input: &DriveInput, config: &DriveConfig) -> DriveSpeeds {
    let sticks = DriveSpeeds::new(
        apply_deadband(input.left_stick, config.deadband),
        apply_deadband(input.right_stick, config.deadband),
    );
    if !sticks.is_zero() {
        return sticks;
    }
    button_speeds(input.button, config.button_speed)
}

pub fn apply_drive(sink: &mut impl ActuatorSink, speeds: DriveSpeeds) {
    sink.set_speed(MotorId::LeftDrive, speeds.left);
    sink.set_speed(MotorId::RightDrive, speeds.right);
}

/// Upper lift has no pots, so all four motors just follow the intent
pub fn upper_lift_speed(intent: ActuatorIntent, config: &OpenLoopConfig) -> i16 {
    match intent {
        ActuatorIntent::Raise => config.raise_speed,
        ActuatorIntent::Lower => config.lower_speed,
        ActuatorIntent::Hold => 0,
    }
}

pub fn apply_upper_lift(sink: &mut impl ActuatorSink, speed: i16) {
    for motor in MotorId::UPPER_LIFT {
        sink.set_speed(motor, speed);
    }
}

pub fn claw_speed(intent: ClawIntent, config: &ClawConfig) -> i16 {
    match intent {
        ClawIntent::Close => config.speed,
        ClawIntent::Open => -config.speed,
        ClawIntent::Hold => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotorMap;
    use crate::hal::MotorFrame;

    #[test]
    fn test_deadband() {
        assert_eq!(apply_deadband(17, 17), 0);
        assert_eq!(apply_deadband(-17, 17), 0);
        assert_eq!(apply_deadband(18, 17), 18);
        assert_eq!(apply_deadband(-90, 17), -90);
        assert_eq!(apply_deadband(0, 0), 0);
    }

    #[test]
    fn test_button_directions() {
        assert_eq!(button_speeds(Some(DriveButton::Forward), 127), DriveSpeeds::new(127, 127));
        assert_eq!(button_speeds(Some(DriveButton::Backward), 127), DriveSpeeds::new(-127, -127));
        assert_eq!(button_speeds(Some(DriveButton::SpinRight), 127), DriveSpeeds::new(127, -127));
        assert_eq!(button_speeds(Some(DriveButton::SpinLeft), 127), DriveSpeeds::new(-127, 127));
        assert_eq!(button_speeds(None, 127), DriveSpeeds::default());
    }

    #[test]
    fn test_sticks_override_buttons() {
        let input = DriveInput {
            left_stick: 60,
            right_stick: 5,
            button: Some(DriveButton::Forward),
        };
        let speeds = drive_speeds(&input, &DriveConfig::default());
        // Right stick is inside the deadband but the pair still overrides
        assert_eq!(speeds, DriveSpeeds::new(60, 0));
    }

    #[test]
    fn test_buttons_when_sticks_centered() {
        let input = DriveInput {
            left_stick: 10,
            right_stick: -12,
            button: Some(DriveButton::SpinLeft),
        };
        let speeds = drive_speeds(&input, &DriveConfig::default());
        assert_eq!(speeds, DriveSpeeds::new(-127, 127));
    }

    #[test]
    fn test_idle_input_stops() {
        let speeds = drive_speeds(&DriveInput::default(), &DriveConfig::default());
        assert!(speeds.is_zero());
    }

    #[test]
    fn test_upper_lift_and_claw() {
        let lift = OpenLoopConfig::default();
        assert_eq!(upper_lift_speed(ActuatorIntent::Raise, &lift), 127);
        assert_eq!(upper_lift_speed(ActuatorIntent::Lower, &lift), -64);
        assert_eq!(upper_lift_speed(ActuatorIntent::Hold, &lift), 0);

        let claw = ClawConfig::default();
        assert_eq!(claw_speed(ClawIntent::Close, &claw), 48);
        assert_eq!(claw_speed(ClawIntent::Open, &claw), -48);
        assert_eq!(claw_speed(ClawIntent::Hold, &claw), 0);
    }

    #[test]
    fn test_apply_upper_lift_sets_all_four() {
        let mut frame = MotorFrame::new(&MotorMap::default(), 127);
        apply_upper_lift(&mut frame, -64);
        for motor in MotorId::UPPER_LIFT {
            assert_eq!(frame.speed(motor), Some(-64));
        }
        assert_eq!(frame.speed(MotorId::Claw), Some(0));
    }
}
