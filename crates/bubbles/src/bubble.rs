use serde::{Deserialize, Serialize};

/// Growth parameters shared by every device.
///
/// The defaults match the classic toy: bubbles start at radius 20 and gain
/// one unit of radius per 100 ms until they cross `max_radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Growth {
    /// Radius at the moment of birth.
    pub initial_radius: f64,
    /// Radius gained per elapsed millisecond.
    pub radius_per_ms: f64,
    /// Strictly-greater-than pop threshold.
    pub max_radius: f64,
}

impl Default for Growth {
    fn default() -> Self {
        Self {
            initial_radius: 20.0,
            radius_per_ms: 0.01,
            max_radius: 100.0,
        }
    }
}

/// A replicated bubble record.
///
/// `born` is an epoch-milliseconds timestamp already corrected for clock
/// skew by the writing device, so readers can age the bubble against their
/// own skew-corrected clock. The serialized field names are the store's
/// child payload shape; changing them breaks cross-device echo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub x: f32,
    pub y: f32,
    pub born: i64,
}

impl Bubble {
    pub fn new(x: f32, y: f32, born: i64) -> Self {
        Self { x, y, born }
    }

    /// Live radius at `now_ms`.
    ///
    /// Exactly `initial_radius + radius_per_ms * (now_ms - born)`; negative
    /// elapsed time (a peer with a faster clock) yields a radius below the
    /// initial one rather than a panic.
    pub fn radius_at(&self, now_ms: i64, growth: &Growth) -> f64 {
        let elapsed_ms = (now_ms - self.born) as f64;
        growth.initial_radius + elapsed_ms * growth.radius_per_ms
    }

    /// Whether the bubble has outgrown the field at `now_ms`.
    ///
    /// Strictly greater than `max_radius`: a bubble sitting exactly on the
    /// threshold is still alive.
    pub fn is_popped(&self, now_ms: i64, growth: &Growth) -> bool {
        self.radius_at(now_ms, growth) > growth.max_radius
    }
}
