// Define message types for the runtime

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SensorMap;
use crate::drive::{ClawIntent, DriveInput};
use crate::lift::{ActuatorIntent, LiftReadings, SensorChannelId};

// Command from teleop/operator input -> runtime
// Intents are already resolved from buttons by the sender
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorCommand {
    pub drive: DriveInput,
    pub lower_lift: ActuatorIntent,
    pub upper_lift: ActuatorIntent,
    pub claw: ClawIntent,
    pub run_autonomous: bool,
}

// Readings from the hardware bridge -> runtime, keyed by port number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorFrame {
    pub analog: BTreeMap<u8, i32>,
    /// true while the input is pressed/active
    pub digital: BTreeMap<u8, bool>,
}

impl SensorFrame {
    pub fn analog(&self, port: u8) -> Option<i32> {
        self.analog.get(&port).copied()
    }

    pub fn digital(&self, port: u8) -> Option<bool> {
        self.digital.get(&port).copied()
    }

    /// Both lift pots, if the frame carries them
    pub fn lift_readings(&self, map: &SensorMap) -> Option<LiftReadings> {
        let left = self.analog(map.port(SensorChannelId::Left)?)?;
        let right = self.analog(map.port(SensorChannelId::Right)?)?;
        Some(LiftReadings { left, right })
    }

    pub fn limit_switch(&self, map: &SensorMap) -> Option<bool> {
        self.digital(map.limit_switch_port?)
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    SensorStale,
    Autonomous,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::DriveButton;

    #[test]
    fn test_operator_command_defaults() {
        let cmd: OperatorCommand = serde_json::from_str("{}").unwrap();
        assert_eq!(cmd, OperatorCommand::default());
        assert_eq!(cmd.lower_lift, ActuatorIntent::Hold);
        assert!(!cmd.run_autonomous);
    }

    #[test]
    fn test_operator_command_json() {
        let cmd: OperatorCommand = serde_json::from_str(
            r#"{ "drive": { "button": "spin_left" }, "lower_lift": "raise", "claw": "close" }"#,
        )
        .unwrap();
        assert_eq!(cmd.drive.button, Some(DriveButton::SpinLeft));
        assert_eq!(cmd.lower_lift, ActuatorIntent::Raise);
        assert_eq!(cmd.claw, ClawIntent::Close);
    }

    #[test]
    fn test_lift_readings_resolved_by_port() {
        let frame: SensorFrame =
            serde_json::from_str(r#"{ "analog": { "1": 1200, "2": -7 }, "digital": { "1": true } }"#)
                .unwrap();
        let map = SensorMap::default();
        assert_eq!(
            frame.lift_readings(&map),
            Some(LiftReadings {
                left: 1200,
                right: -7
            })
        );
        assert_eq!(frame.limit_switch(&map), Some(true));
    }

    #[test]
    fn test_missing_pot_gives_no_readings() {
        let frame = SensorFrame {
            analog: BTreeMap::from([(1, 500)]),
            ..SensorFrame::default()
        };
        assert_eq!(frame.lift_readings(&SensorMap::default()), None);
    }

    #[test]
    fn test_health_json() {
        assert_eq!(
            serde_json::to_string(&RuntimeHealth::SensorStale).unwrap(),
            "\"sensor_stale\""
        );
    }
}
