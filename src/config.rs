// Timeouts, topics, and the validated robot configuration
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::autonomous::AutonomousStep;
use crate::hal::MotorId;
use crate::lift::SensorChannelId;

// Runtime loop frequency (20ms operator loop)
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Sensor frames older than this can't be trusted for leveling
pub const SENSOR_TIMEOUT: Duration = Duration::from_millis(100);

// Zenoh topics
pub const TOPIC_CMD_OPERATOR: &str = "robot/cmd/operator"; // operator input
pub const TOPIC_SENSOR_ANALOG: &str = "robot/sensor/analog"; // pot + switch readings
pub const TOPIC_RT_MOTORS: &str = "robot/rt/motors"; // actuation
pub const TOPIC_HEALTH: &str = "robot/state/health"; // health status

/// Motor ports on the controller are numbered 1..=10
pub const MAX_MOTOR_PORT: u8 = 10;

/// Analog inputs are numbered 1..=8
pub const MAX_ANALOG_PORT: u8 = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Paired lift leveling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    pub raise_speed: i16,
    /// Signed, negative moves down
    pub lower_speed: i16,
    /// Max normalized disagreement before one side is stalled
    pub tolerance: f32,
    pub scale_factor_left: f32,
    pub scale_factor_right: f32,
    /// Raw readings below this count as the rest position
    pub floor: f32,
    /// Speed limit for every motor port, not just the lift. Drive, claw and
    /// upper lift speeds are validated against it and every frame clamps to it.
    pub max_speed: i16,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            raise_speed: 127,
            lower_speed: -64,
            tolerance: 0.05,
            scale_factor_left: 2000.0,
            scale_factor_right: 1720.0,
            floor: 0.0,
            max_speed: 127,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Stick values with magnitude at or below this are ignored
    pub deadband: i16,
    pub button_speed: i16,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            deadband: 17,
            button_speed: 127,
        }
    }
}

/// Raise/lower speeds for a motor group without feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenLoopConfig {
    pub raise_speed: i16,
    pub lower_speed: i16,
}

impl Default for OpenLoopConfig {
    fn default() -> Self {
        Self {
            raise_speed: 127,
            lower_speed: -64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawConfig {
    pub speed: i16,
}

impl Default for ClawConfig {
    fn default() -> Self {
        Self { speed: 48 }
    }
}

/// Motor port assignment and direction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorMap {
    pub ports: BTreeMap<MotorId, u8>,
    pub reversed: Vec<MotorId>,
}

impl Default for MotorMap {
    fn default() -> Self {
        let ports = MotorId::ALL
            .iter()
            .zip(1..=MAX_MOTOR_PORT)
            .map(|(&motor, port)| (motor, port))
            .collect();
        Self {
            ports,
            reversed: vec![MotorId::LowerLiftRight],
        }
    }
}

impl MotorMap {
    pub fn port(&self, motor: MotorId) -> Option<u8> {
        self.ports.get(&motor).copied()
    }

    pub fn is_reversed(&self, motor: MotorId) -> bool {
        self.reversed.contains(&motor)
    }
}

/// Sensor port assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorMap {
    pub analog: BTreeMap<SensorChannelId, u8>,
    /// Digital port of the start-side limit switch, if fitted
    pub limit_switch_port: Option<u8>,
}

impl Default for SensorMap {
    fn default() -> Self {
        Self {
            analog: BTreeMap::from([(SensorChannelId::Left, 1), (SensorChannelId::Right, 2)]),
            limit_switch_port: Some(1),
        }
    }
}

impl SensorMap {
    pub fn port(&self, channel: SensorChannelId) -> Option<u8> {
        self.analog.get(&channel).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomousConfig {
    pub lift_raise_speed: i16,
    pub lift_lower_speed: i16,
    pub steps: Vec<AutonomousStep>,
}

impl Default for AutonomousConfig {
    fn default() -> Self {
        Self {
            lift_raise_speed: 127,
            lift_lower_speed: -100,
            // Drive forward under the cone
            steps: vec![AutonomousStep::Drive {
                speed: 127,
                duration_ms: 5700,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lift: LiftConfig,
    pub drive: DriveConfig,
    pub upper_lift: OpenLoopConfig,
    pub claw: ClawConfig,
    pub motors: MotorMap,
    pub sensors: SensorMap,
    pub autonomous: AutonomousConfig,
}

impl RuntimeConfig {
    /// Load a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the control loop can't run with
    ///
    /// Called once at startup so nothing is checked per tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.lift.max_speed;
        if max <= 0 {
            return Err(invalid("lift.max_speed", format!("must be positive, got {}", max)));
        }

        check_raise("lift.raise_speed", self.lift.raise_speed, max)?;
        check_lower("lift.lower_speed", self.lift.lower_speed, max)?;
        check_raise("upper_lift.raise_speed", self.upper_lift.raise_speed, max)?;
        check_lower("upper_lift.lower_speed", self.upper_lift.lower_speed, max)?;
        check_raise("claw.speed", self.claw.speed, max)?;
        check_raise("drive.button_speed", self.drive.button_speed, max)?;
        check_raise("autonomous.lift_raise_speed", self.autonomous.lift_raise_speed, max)?;
        check_lower("autonomous.lift_lower_speed", self.autonomous.lift_lower_speed, max)?;

        if !(self.lift.tolerance.is_finite() && self.lift.tolerance >= 0.0) {
            return Err(invalid(
                "lift.tolerance",
                format!("must be finite and >= 0, got {}", self.lift.tolerance),
            ));
        }
        check_scale("lift.scale_factor_left", self.lift.scale_factor_left)?;
        check_scale("lift.scale_factor_right", self.lift.scale_factor_right)?;
        if !(self.lift.floor.is_finite() && self.lift.floor >= 0.0) {
            return Err(invalid(
                "lift.floor",
                format!("must be finite and >= 0, got {}", self.lift.floor),
            ));
        }

        if self.drive.deadband < 0 {
            return Err(invalid(
                "drive.deadband",
                format!("must be >= 0, got {}", self.drive.deadband),
            ));
        }

        for step in &self.autonomous.steps {
            if let AutonomousStep::Drive { speed, .. } = step {
                if speed.unsigned_abs() > max.unsigned_abs() {
                    return Err(invalid(
                        "autonomous.steps",
                        format!("drive speed {} exceeds max_speed {}", speed, max),
                    ));
                }
            }
        }

        self.validate_motor_ports()?;
        self.validate_sensor_ports()
    }

    fn validate_motor_ports(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for motor in MotorId::ALL {
            let Some(port) = self.motors.port(motor) else {
                return Err(invalid("motors.ports", format!("no port for {:?}", motor)));
            };
            if !(1..=MAX_MOTOR_PORT).contains(&port) {
                return Err(invalid(
                    "motors.ports",
                    format!("{:?} on port {} (expected 1..={})", motor, port, MAX_MOTOR_PORT),
                ));
            }
            if !seen.insert(port) {
                return Err(invalid("motors.ports", format!("port {} assigned twice", port)));
            }
        }
        Ok(())
    }

    fn validate_sensor_ports(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for channel in [SensorChannelId::Left, SensorChannelId::Right] {
            let Some(port) = self.sensors.port(channel) else {
                return Err(invalid("sensors.analog", format!("no port for {:?}", channel)));
            };
            if !(1..=MAX_ANALOG_PORT).contains(&port) {
                return Err(invalid(
                    "sensors.analog",
                    format!("{:?} on port {} (expected 1..={})", channel, port, MAX_ANALOG_PORT),
                ));
            }
            if !seen.insert(port) {
                return Err(invalid("sensors.analog", format!("port {} assigned twice", port)));
            }
        }
        Ok(())
    }
}

fn check_raise(field: &'static str, speed: i16, max: i16) -> Result<(), ConfigError> {
    if speed <= 0 || speed > max {
        return Err(invalid(field, format!("must be in 1..={}, got {}", max, speed)));
    }
    Ok(())
}

fn check_lower(field: &'static str, speed: i16, max: i16) -> Result<(), ConfigError> {
    if speed >= 0 || speed < -max {
        return Err(invalid(field, format!("must be in -{}..=-1, got {}", max, speed)));
    }
    Ok(())
}

fn check_scale(field: &'static str, scale: f32) -> Result<(), ConfigError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(invalid(field, format!("must be positive, got {}", scale)));
    }
    Ok(())
}
