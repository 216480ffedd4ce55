//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! It avoids SIMD/unsafe and focuses on stable semantics.

use serde::{Deserialize, Serialize};

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, to: Self) -> f32 {
        (to.x - self.x).hypot(to.y - self.y)
    }

    /// Bearing angle (radians) from this point toward another.
    pub fn bearing(self, to: Self) -> f32 {
        (to.y - self.y).atan2(to.x - self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_distance_on_axis() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn vec2_bearing_quadrants() {
        let origin = Vec2::ZERO;
        assert_eq!(origin.bearing(Vec2::new(1.0, 0.0)), 0.0);
        let up = origin.bearing(Vec2::new(0.0, 1.0));
        assert!((up - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
