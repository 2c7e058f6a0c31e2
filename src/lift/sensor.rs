// Potentiometer normalization
//
// Converts raw analog readings to a device-independent position so the two
// lift sides can be compared even when their pots have different ranges.

use serde::{Deserialize, Serialize};

/// Which side of the paired lift a sensor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannelId {
    Left,
    Right,
}

/// Normalized lift position. Never negative; may exceed 1.0 on over-travel.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct NormalizedPosition(f32);

impl NormalizedPosition {
    pub const ZERO: Self = Self(0.0);

    pub fn value(self) -> f32 {
        self.0
    }
}

/// One raw reading together with the calibration needed to normalize it
#[derive(Debug, Clone, Copy)]
pub struct SensorChannel {
    pub raw_value: i32,
    pub scale_factor: f32,
    pub floor: f32,
}

impl SensorChannel {
    pub fn new(raw_value: i32, scale_factor: f32, floor: f32) -> Self {
        Self {
            raw_value,
            scale_factor,
            floor,
        }
    }

    pub fn position(&self) -> NormalizedPosition {
        normalize(self.raw_value, self.scale_factor, self.floor)
    }
}

/// Convert a raw reading to a normalized position
///
/// Readings below `floor` (including negative calibration offsets) read as the
/// rest position, as do negative readings above a negative floor. `scale_factor`
/// must be positive; that is checked once when the config is loaded, not here.
pub fn normalize(raw: i32, scale_factor: f32, floor: f32) -> NormalizedPosition {
    let raw = raw as f32;
    if raw < floor || raw <= 0.0 {
        return NormalizedPosition::ZERO;
    }
    NormalizedPosition(raw / scale_factor)
}
