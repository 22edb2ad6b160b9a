//! Resolving the block a player is aiming at.

mod raycast;

pub use raycast::{RaycastHit, cell_of, raycast};

use serde::{Deserialize, Serialize};
use stick_utils::math::Vector3;

/// Where a player is looking, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Tilt from the horizontal. Positive looks down.
    pub pitch: f64,
    /// Rotation about the vertical axis. Zero faces +x, 90 faces +z.
    pub yaw: f64,
}

impl Rotation {
    /// Creates a rotation from degrees.
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    /// The unit view direction.
    #[must_use]
    pub fn direction(self) -> Vector3<f64> {
        let pitch = self.pitch.to_radians();
        let yaw = self.yaw.to_radians();
        Vector3::new(
            pitch.cos() * yaw.cos(),
            -pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3<f64>, b: Vector3<f64>) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_direction() {
        assert_eq!(Rotation::new(0.0, 0.0).direction(), Vector3::new(1.0, 0.0, 0.0));
        assert!(close(Rotation::new(0.0, 90.0).direction(), Vector3::new(0.0, 0.0, 1.0)));
        assert!(close(Rotation::new(90.0, 0.0).direction(), Vector3::new(0.0, -1.0, 0.0)));
        assert!(close(Rotation::new(-90.0, 0.0).direction(), Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_direction_is_unit() {
        let direction = Rotation::new(33.0, -147.0).direction();
        assert!((direction.length() - 1.0).abs() < 1e-12);
    }
}
