//! Small geometric types shared by helpers and compound signals.

use std::any::Any;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::tweening::helpers::map;
use crate::tweening::interpolation::Lerp;
use crate::value::{Interpolatable, Value};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };
    pub const ONE: Vector2 = Vector2 { x: 1.0, y: 1.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn lerp(&self, to: &Vector2, progress: f64) -> Vector2 {
        Vector2::new(map(self.x, to.x, progress), map(self.y, to.y, progress))
    }

    /// Components in `[x, y]` order, as used by compound signals.
    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Vector2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl Lerp for Vector2 {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        from.lerp(to, progress)
    }
}

impl Interpolatable for Vector2 {
    fn lerp_to(&self, to: &Value, progress: f64) -> Option<Value> {
        let to = to.downcast_custom::<Vector2>()?;
        Some(Value::custom(self.lerp(to, progress)))
    }

    fn eq_dyn(&self, other: &dyn Interpolatable) -> bool {
        other.as_any().downcast_ref::<Vector2>() == Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_and_ops() {
        let a = Vector2::new(0.0, 10.0);
        let b = Vector2::new(10.0, 20.0);
        assert_eq!(a.lerp(&b, 0.5), Vector2::new(5.0, 15.0));
        assert_eq!(b - a, Vector2::new(10.0, 10.0));
        assert_eq!((a + b) * 0.5, Vector2::new(5.0, 15.0));
        assert_eq!(-Vector2::ONE, Vector2::new(-1.0, -1.0));
        assert_eq!(Vector2::from([3.0, 4.0]).magnitude(), 5.0);
    }
}
