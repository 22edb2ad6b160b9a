//! A small generic three component vector.

use std::fmt::{self, Display};
use std::ops::{Add, Mul, Neg, Sub};

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// A vector with three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector3<T> {
    /// The x component.
    pub x: T,
    /// The y component.
    pub y: T,
    /// The z component.
    pub z: T,
}

impl<T> Vector3<T> {
    /// Creates a new vector.
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Copy> Vector3<T> {
    /// Creates a vector with all components set to `value`.
    pub const fn splat(value: T) -> Self {
        Self::new(value, value, value)
    }

    /// Applies `f` to every component.
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Vector3<U> {
        Vector3::new(f(self.x), f(self.y), f(self.z))
    }
}

impl<T: Float> Vector3<T> {
    /// Returns the euclidean length.
    pub fn length(self) -> T {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns the vector scaled to unit length.
    ///
    /// A zero vector is returned unchanged.
    #[must_use]
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == T::zero() {
            return self;
        }
        Self::new(self.x / length, self.y / length, self.z / length)
    }
}

impl<T: Add<Output = T>> Add for Vector3<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Sub<Output = T>> Sub for Vector3<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Vector3<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl<T: Neg<Output = T>> Neg for Vector3<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl<T: Display> Display for Vector3<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let v = Vector3::new(3.0_f64, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero() {
        let v = Vector3::new(0.0_f64, 0.0, 0.0);
        assert_eq!(v.normalize(), v);
    }

    #[test]
    fn test_display() {
        assert_eq!(Vector3::new(1, -2, 3).to_string(), "1 -2 3");
    }
}
