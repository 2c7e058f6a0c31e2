// Paired-lift synchronizer
//
// Bang-bang leveling: when the two sides drift apart by more than the
// tolerance, the side leading in the direction of travel stalls and only the
// lagging side keeps moving until they are level again.

use serde::{Deserialize, Serialize};

use super::sensor::NormalizedPosition;

/// Commanded direction for the paired lift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorIntent {
    Raise,
    Lower,
    #[default]
    Hold,
}

/// Speeds for the two sides of the lift for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub left_speed: i16,
    pub right_speed: i16,
}

impl ActuatorCommand {
    pub fn new(left_speed: i16, right_speed: i16) -> Self {
        Self {
            left_speed,
            right_speed,
        }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    fn both(speed: i16) -> Self {
        Self::new(speed, speed)
    }
}

/// Compute the lift command for one tick
///
/// `lower_speed` is signed (negative moves down) and is emitted as given.
/// A tolerance <= 0 only lets both sides move on exactly equal readings.
pub fn compute(
    left: NormalizedPosition,
    right: NormalizedPosition,
    intent: ActuatorIntent,
    raise_speed: i16,
    lower_speed: i16,
    tolerance: f32,
) -> ActuatorCommand {
    let diff = left.value() - right.value();
    let tolerance = tolerance.max(0.0);

    let left_higher = diff > tolerance;
    let right_higher = -diff > tolerance;

    match intent {
        ActuatorIntent::Hold => ActuatorCommand::stop(),
        ActuatorIntent::Raise => {
            if left_higher {
                ActuatorCommand::new(0, raise_speed)
            } else if right_higher {
                ActuatorCommand::new(raise_speed, 0)
            } else {
                ActuatorCommand::both(raise_speed)
            }
        }
        // When lowering, the lower side is the one ahead
        ActuatorIntent::Lower => {
            if left_higher {
                ActuatorCommand::new(lower_speed, 0)
            } else if right_higher {
                ActuatorCommand::new(0, lower_speed)
            } else {
                ActuatorCommand::both(lower_speed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::sensor::normalize;

    fn pos(raw: i32) -> NormalizedPosition {
        // 1000 counts per unit keeps the test values exact
        normalize(raw, 1000.0, 0.0)
    }

    #[test]
    fn test_left_ahead_raising_stalls_left() {
        let cmd = compute(pos(500), pos(300), ActuatorIntent::Raise, 127, -64, 0.10);
        assert_eq!(cmd, ActuatorCommand::new(0, 127));
    }

    #[test]
    fn test_within_tolerance_raises_together() {
        let cmd = compute(pos(410), pos(400), ActuatorIntent::Raise, 127, -64, 0.10);
        assert_eq!(cmd, ActuatorCommand::new(127, 127));
    }

    #[test]
    fn test_right_ahead_raising_stalls_right() {
        let cmd = compute(pos(100), pos(400), ActuatorIntent::Raise, 127, -64, 0.10);
        assert_eq!(cmd, ActuatorCommand::new(127, 0));
    }

    #[test]
    fn test_hold_always_stops() {
        for (l, r) in [(0, 0), (900, 100), (100, 900), (450, 455)] {
            let cmd = compute(pos(l), pos(r), ActuatorIntent::Hold, 127, -64, 0.10);
            assert_eq!(cmd, ActuatorCommand::stop(), "l={} r={}", l, r);
        }
    }

    #[test]
    fn test_equal_positions_move_together() {
        for tolerance in [0.0, 0.05, 0.5] {
            let raise = compute(pos(250), pos(250), ActuatorIntent::Raise, 127, -64, tolerance);
            assert_eq!(raise, ActuatorCommand::new(127, 127));
            let lower = compute(pos(250), pos(250), ActuatorIntent::Lower, 127, -64, tolerance);
            assert_eq!(lower, ActuatorCommand::new(-64, -64));
        }
    }

    #[test]
    fn test_left_higher_lowering_drives_left_only() {
        let cmd = compute(pos(600), pos(300), ActuatorIntent::Lower, 127, -64, 0.10);
        assert_eq!(cmd, ActuatorCommand::new(-64, 0));
    }

    #[test]
    fn test_right_higher_lowering_drives_right_only() {
        let cmd = compute(pos(300), pos(600), ActuatorIntent::Lower, 127, -64, 0.10);
        assert_eq!(cmd, ActuatorCommand::new(0, -64));
    }

    #[test]
    fn test_lowering_within_tolerance_moves_together() {
        let cmd = compute(pos(350), pos(300), ActuatorIntent::Lower, 127, -64, 0.10);
        assert_eq!(cmd, ActuatorCommand::new(-64, -64));
    }

    #[test]
    fn test_zero_tolerance_is_strict_equality() {
        let cmd = compute(pos(301), pos(300), ActuatorIntent::Raise, 127, -64, 0.0);
        assert_eq!(cmd, ActuatorCommand::new(0, 127));
        let cmd = compute(pos(300), pos(300), ActuatorIntent::Raise, 127, -64, 0.0);
        assert_eq!(cmd, ActuatorCommand::new(127, 127));
    }

    #[test]
    fn test_negative_tolerance_behaves_like_zero() {
        let cmd = compute(pos(300), pos(300), ActuatorIntent::Lower, 127, -64, -0.2);
        assert_eq!(cmd, ActuatorCommand::new(-64, -64));
        let cmd = compute(pos(300), pos(301), ActuatorIntent::Lower, 127, -64, -0.2);
        assert_eq!(cmd, ActuatorCommand::new(0, -64));
    }

    #[test]
    fn test_leading_side_never_driven_when_out_of_tolerance() {
        // Sweep imbalances and check the leading side is always stalled
        for l in (0..=1000).step_by(50) {
            for r in (0..=1000).step_by(50) {
                let diff = (l - r) as f32 / 1000.0;
                if diff.abs() <= 0.1 {
                    continue;
                }
                let up = compute(pos(l), pos(r), ActuatorIntent::Raise, 127, -64, 0.1);
                let down = compute(pos(l), pos(r), ActuatorIntent::Lower, 127, -64, 0.1);
                if l > r {
                    assert_eq!(up.left_speed, 0);
                    assert_eq!(down.right_speed, 0);
                } else {
                    assert_eq!(up.right_speed, 0);
                    assert_eq!(down.left_speed, 0);
                }
            }
        }
    }

    #[test]
    fn test_intent_deserializes_from_snake_case() {
        let intent: ActuatorIntent = serde_json::from_str("\"raise\"").unwrap();
        assert_eq!(intent, ActuatorIntent::Raise);
    }
}
