//! 2D vector helpers on top of `glam::Vec2`
//!
//! glam covers add/sub/scale/dot/length. The helpers here pin down the
//! zero-length behavior the simulation relies on: nothing in this module ever
//! divides by a zero magnitude.

use glam::Vec2;

/// Length of `v`
#[inline]
pub fn magnitude(v: Vec2) -> f32 {
    v.length()
}

/// Unit vector in the direction of `v`, or zero for a zero-length `v`
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Angle of the direction from `a` to `b` (radians, world frame)
#[inline]
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Rotate `v` counter-clockwise by `theta` radians
#[inline]
pub fn rotate(v: Vec2, theta: f32) -> Vec2 {
    let (sin, cos) = theta.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Linear interpolation; `t` is not clamped
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Reflect `v` about `normal`: v - 2(v·n̂)n̂
///
/// The normal is normalized here, so callers may pass any non-unit normal.
/// A zero normal leaves `v` unchanged.
#[inline]
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    let n = normal.normalize_or_zero();
    v - 2.0 * v.dot(n) * n
}

/// `v` rescaled to length `m` (zero stays zero)
#[inline]
pub fn set_magnitude(v: Vec2, m: f32) -> Vec2 {
    v.normalize_or_zero() * m
}

/// `v` shortened to at most `max` length
#[inline]
pub fn limit(v: Vec2, max: f32) -> Vec2 {
    if v.length_squared() > max * max {
        set_magnitude(v, max)
    } else {
        v
    }
}
