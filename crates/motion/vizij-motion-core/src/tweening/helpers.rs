//! Numeric helpers used by timing functions and interpolators.

use crate::types::Vector2;

/// Linear blend between `from` and `to`.
#[inline]
pub fn map(from: f64, to: f64, value: f64) -> f64 {
    from + (to - from) * value
}

/// Rescale `value` from `[from_a, to_a]` into `[from_b, to_b]`.
#[inline]
pub fn remap(from_a: f64, to_a: f64, from_b: f64, to_b: f64, value: f64) -> f64 {
    (value - from_a) * (to_b - from_b) / (to_a - from_a) + from_b
}

/// Bound `value` to `[min, max]`.
#[inline]
pub fn clamp(min: f64, max: f64, value: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// `remap` followed by a clamp into the target range (which may be reversed).
#[inline]
pub fn clamp_remap(from_a: f64, to_a: f64, from_b: f64, to_b: f64, value: f64) -> f64 {
    let remapped = remap(from_a, to_a, from_b, to_b, value);
    if from_b > to_b {
        clamp(to_b, from_b, remapped)
    } else {
        clamp(from_b, to_b, remapped)
    }
}

/// Position on a quarter arc at `value`.
///
/// `ratio` is the width/height ratio of the arc's bounding box; `reverse`
/// swaps which axis leads.
pub fn arc_lerp(value: f64, reverse: bool, ratio: f64) -> Vector2 {
    let mut flip = reverse;
    let mut ratio = ratio;
    if ratio > 1.0 {
        ratio = 1.0 / ratio;
    } else {
        flip = !flip;
    }

    let normalized = if flip {
        clamp(-1.0, 1.0, 1.0 - value).acos()
    } else {
        clamp(-1.0, 1.0, value).asin()
    };
    let radians = map(normalized, map(0.0, std::f64::consts::FRAC_PI_2, value), ratio);

    let x = radians.sin();
    let y = 1.0 - radians.cos();
    if reverse {
        Vector2::new(y, x)
    } else {
        Vector2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn map_endpoints_and_midpoint() {
        for (a, b) in [(0.0, 1.0), (-3.5, 7.25), (100.0, -20.0), (2.0, 2.0)] {
            assert_eq!(map(a, b, 0.0), a);
            assert_eq!(map(a, b, 1.0), b);
            assert_eq!(map(a, b, 0.5), (a + b) / 2.0);
        }
    }

    #[test]
    fn remap_and_clamp() {
        assert_eq!(remap(0.0, 10.0, 0.0, 100.0, 5.0), 50.0);
        assert_eq!(remap(0.0, 1.0, 10.0, 20.0, 2.0), 30.0);
        assert_eq!(clamp(0.0, 1.0, 1.5), 1.0);
        assert_eq!(clamp(0.0, 1.0, -0.5), 0.0);
        assert_eq!(clamp_remap(0.0, 1.0, 10.0, 20.0, 2.0), 20.0);
        assert_eq!(clamp_remap(0.0, 1.0, 20.0, 10.0, 2.0), 10.0);
        assert_eq!(clamp_remap(0.0, 1.0, 20.0, 10.0, 0.5), 15.0);
    }

    #[test]
    fn arc_lerp_endpoints() {
        assert_abs_diff_eq!(arc_lerp(0.0, false, 1.0).x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(arc_lerp(1.0, false, 1.0).y, 1.0, epsilon = 1e-12);
        let reversed = arc_lerp(1.0, true, 1.0);
        assert_abs_diff_eq!(reversed.x, 1.0, epsilon = 1e-12);
    }
}
