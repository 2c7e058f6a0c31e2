// Motor identifiers and the actuator sink
//
// Control code addresses motors by `MotorId`; port numbers and direction
// reversal are resolved here, at the boundary to the hardware bridge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MotorMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorId {
    LeftDrive,
    RightDrive,
    LowerLiftLeft,
    LowerLiftRight,
    #[serde(rename = "upper_lift_left_1")]
    UpperLiftLeft1,
    #[serde(rename = "upper_lift_left_2")]
    UpperLiftLeft2,
    #[serde(rename = "upper_lift_right_1")]
    UpperLiftRight1,
    #[serde(rename = "upper_lift_right_2")]
    UpperLiftRight2,
    Claw,
}

impl MotorId {
    pub const ALL: [MotorId; 9] = [
        MotorId::LeftDrive,
        MotorId::RightDrive,
        MotorId::LowerLiftLeft,
        MotorId::LowerLiftRight,
        MotorId::UpperLiftLeft1,
        MotorId::UpperLiftLeft2,
        MotorId::UpperLiftRight1,
        MotorId::UpperLiftRight2,
        MotorId::Claw,
    ];

    pub const UPPER_LIFT: [MotorId; 4] = [
        MotorId::UpperLiftLeft1,
        MotorId::UpperLiftLeft2,
        MotorId::UpperLiftRight1,
        MotorId::UpperLiftRight2,
    ];
}

/// Anything that accepts per-motor speed commands
pub trait ActuatorSink {
    fn set_speed(&mut self, motor: MotorId, speed: i16);

    fn stop(&mut self, motor: MotorId) {
        self.set_speed(motor, 0);
    }

    fn stop_all(&mut self) {
        for motor in MotorId::ALL {
            self.stop(motor);
        }
    }
}

/// Speed commands for one tick, keyed by motor port
///
/// Starts with every mapped motor at 0, so a tick always commands every motor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorFrame {
    pub ports: BTreeMap<u8, i16>,
    #[serde(skip)]
    map: MotorMap,
    #[serde(skip)]
    max_speed: i16,
}

impl MotorFrame {
    pub fn new(map: &MotorMap, max_speed: i16) -> Self {
        let ports = map.ports.values().map(|&port| (port, 0)).collect();
        Self {
            ports,
            map: map.clone(),
            max_speed,
        }
    }

    /// Speed currently set for a motor, as it will be sent (reversal applied)
    pub fn port_speed(&self, motor: MotorId) -> Option<i16> {
        self.map
            .port(motor)
            .and_then(|port| self.ports.get(&port).copied())
    }

    /// Speed as the control code commanded it (reversal undone)
    pub fn speed(&self, motor: MotorId) -> Option<i16> {
        let raw = self.port_speed(motor)?;
        Some(if self.map.is_reversed(motor) { -raw } else { raw })
    }
}

impl ActuatorSink for MotorFrame {
    fn set_speed(&mut self, motor: MotorId, speed: i16) {
        let Some(port) = self.map.port(motor) else {
            debug!("No port mapped for {:?}, dropping speed {}", motor, speed);
            return;
        };

        let clamped = speed.clamp(-self.max_speed, self.max_speed);
        let out = if self.map.is_reversed(motor) {
            -clamped
        } else {
            clamped
        };
        self.ports.insert(port, out);
    }
}
