//! Collision detection for circles, sword segments and the arena box
//!
//! Everything in the arena is a circle (combatant bodies, the ball) except
//! swords, which are finite line segments. Detection lives here; the velocity
//! response lives in `physics`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_HEIGHT, ARENA_PADDING, ARENA_WIDTH};

/// Anything with a circular footprint
pub trait Body {
    fn pos(&self) -> Vec2;
    fn set_pos(&mut self, pos: Vec2);
    fn radius(&self) -> f32;
}

/// Axis-aligned playable area (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::arena()
    }
}

impl Bounds {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self { left, right, top, bottom }
    }

    /// The standard arena: full canvas minus padding on every side
    pub fn arena() -> Self {
        Self::new(
            ARENA_PADDING,
            ARENA_WIDTH - ARENA_PADDING,
            ARENA_PADDING,
            ARENA_HEIGHT - ARENA_PADDING,
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether a point lies inside (edges inclusive)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Closest position to `pos` that keeps a circle of `radius` fully inside.
    /// If the box is narrower than the circle on an axis, the circle is centered on it.
    pub fn clamp_circle(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(pos.x, self.left + radius, self.right - radius),
            clamp_axis(pos.y, self.top + radius, self.bottom - radius),
        )
    }

    /// Which walls a circle has crossed
    pub fn wall_contacts(&self, pos: Vec2, radius: f32) -> WallContacts {
        WallContacts {
            left: pos.x - radius < self.left,
            right: pos.x + radius > self.right,
            top: pos.y - radius < self.top,
            bottom: pos.y + radius > self.bottom,
        }
    }
}

fn clamp_axis(v: f32, min: f32, max: f32) -> f32 {
    if min > max {
        (min + max) * 0.5
    } else {
        v.clamp(min, max)
    }
}

/// Walls crossed by a circle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContacts {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl WallContacts {
    pub fn x(&self) -> bool {
        self.left || self.right
    }

    pub fn y(&self) -> bool {
        self.top || self.bottom
    }

    pub fn any(&self) -> bool {
        self.x() || self.y()
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the obstacle to the circle center
    pub point: Vec2,
    /// Unit vector from `point` toward the circle center
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// True iff the two circles strictly overlap
pub fn circle_overlap<A: Body + ?Sized, B: Body + ?Sized>(a: &A, b: &B) -> bool {
    circles_overlap(a.pos(), a.radius(), b.pos(), b.radius())
}

/// Circle-circle overlap on raw values
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    (a - b).length() < ra + rb
}

/// Push a body back inside the bounds
pub fn clamp_to_bounds<B: Body + ?Sized>(body: &mut B, bounds: &Bounds) {
    let clamped = bounds.clamp_circle(body.pos(), body.radius());
    body.set_pos(clamped);
}

/// Closest point on the finite segment `start..end` to `p`.
/// A zero-length segment collapses to `start`.
pub fn closest_point_on_segment(start: Vec2, end: Vec2, p: Vec2) -> Vec2 {
    let seg = end - start;
    let len_sq = seg.length_squared();
    if len_sq < 1e-8 {
        return start;
    }
    let t = ((p - start).dot(seg) / len_sq).clamp(0.0, 1.0);
    start + seg * t
}

/// Closest-point test between a sword segment and a circle
///
/// Hits when the closest point on the segment lies within `radius` of the
/// center (touching counts). The returned normal points from the segment
/// toward the circle.
pub fn segment_circle_intersect(
    seg_start: Vec2,
    seg_end: Vec2,
    center: Vec2,
    radius: f32,
) -> CollisionResult {
    let closest = closest_point_on_segment(seg_start, seg_end, center);
    let offset = center - closest;
    let dist = offset.length();

    if dist > radius {
        return CollisionResult::miss();
    }

    let mut normal = offset.normalize_or_zero();
    if normal == Vec2::ZERO {
        // Center sits on the segment: fall back to the segment perpendicular
        normal = (seg_end - seg_start).perp().normalize_or_zero();
        if normal == Vec2::ZERO {
            normal = Vec2::X;
        }
    }

    CollisionResult {
        hit: true,
        point: closest,
        normal,
        penetration: radius - dist,
    }
}

/// Quadratic-root test: parametric entry/exit `t ∈ [0, 1]` where the segment
/// from `seg_start` to `seg_end` passes within `radius` of `center`.
///
/// Returns `None` when the segment never gets that close. A segment that
/// starts inside the circle reports an entry of 0.
pub fn segment_circle_roots(
    seg_start: Vec2,
    seg_end: Vec2,
    center: Vec2,
    radius: f32,
) -> Option<(f32, f32)> {
    let d = seg_end - seg_start;
    let f = seg_start - center;

    let a = d.dot(d);
    let c = f.dot(f) - radius * radius;
    if a < 1e-8 {
        // Degenerate segment behaves as a point
        return (c <= 0.0).then_some((0.0, 0.0));
    }
    let b = 2.0 * f.dot(d);

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_disc = discriminant.sqrt();
    let t0 = (-b - sqrt_disc) / (2.0 * a);
    let t1 = (-b + sqrt_disc) / (2.0 * a);

    if t1 < 0.0 || t0 > 1.0 {
        return None;
    }
    Some((t0.max(0.0), t1.min(1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Disc {
        pos: Vec2,
        radius: f32,
    }

    impl Body for Disc {
        fn pos(&self) -> Vec2 {
            self.pos
        }
        fn set_pos(&mut self, pos: Vec2) {
            self.pos = pos;
        }
        fn radius(&self) -> f32 {
            self.radius
        }
    }

    #[test]
    fn test_circle_overlap_is_strict() {
        let a = Disc { pos: Vec2::ZERO, radius: 10.0 };
        let touching = Disc { pos: Vec2::new(20.0, 0.0), radius: 10.0 };
        let overlapping = Disc { pos: Vec2::new(19.0, 0.0), radius: 10.0 };
        assert!(!circle_overlap(&a, &touching));
        assert!(circle_overlap(&a, &overlapping));
    }

    #[test]
    fn test_segment_circle_hit_mid_segment() {
        let result = segment_circle_intersect(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(50.0, 8.0),
            10.0,
        );
        assert!(result.hit);
        assert!((result.point - Vec2::new(50.0, 0.0)).length() < 1e-4);
        assert!((result.normal - Vec2::Y).length() < 1e-4);
        assert!((result.penetration - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_segment_circle_beyond_tip() {
        // Past the end of the segment the closest point is the tip
        let result = segment_circle_intersect(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(115.0, 0.0),
            10.0,
        );
        assert!(!result.hit);

        let result = segment_circle_intersect(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(105.0, 0.0),
            10.0,
        );
        assert!(result.hit);
        assert_eq!(result.point, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let p = Vec2::new(3.0, 3.0);
        let result = segment_circle_intersect(p, p, Vec2::new(3.0, 8.0), 6.0);
        assert!(result.hit);
        assert_eq!(result.point, p);

        let result = segment_circle_intersect(p, p, Vec2::new(3.0, 20.0), 6.0);
        assert!(!result.hit);
    }

    #[test]
    fn test_center_on_segment_has_valid_normal() {
        let result =
            segment_circle_intersect(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(5.0, 0.0), 3.0);
        assert!(result.hit);
        assert!((result.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_segment_circle_roots() {
        // Horizontal segment through a circle at x=50
        let (t0, t1) = segment_circle_roots(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(50.0, 0.0),
            10.0,
        )
        .expect("segment crosses circle");
        assert!((t0 - 0.4).abs() < 1e-4);
        assert!((t1 - 0.6).abs() < 1e-4);

        assert!(
            segment_circle_roots(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 30.0), 10.0)
                .is_none()
        );
        // Stops short of the circle
        assert!(
            segment_circle_roots(Vec2::ZERO, Vec2::new(30.0, 0.0), Vec2::new(50.0, 0.0), 10.0)
                .is_none()
        );
    }

    #[test]
    fn test_clamp_to_bounds() {
        let bounds = Bounds::new(0.0, 100.0, 0.0, 50.0);
        let mut disc = Disc { pos: Vec2::new(-20.0, 70.0), radius: 5.0 };
        clamp_to_bounds(&mut disc, &bounds);
        assert_eq!(disc.pos, Vec2::new(5.0, 45.0));

        // Inside stays put
        let mut disc = Disc { pos: Vec2::new(40.0, 20.0), radius: 5.0 };
        clamp_to_bounds(&mut disc, &bounds);
        assert_eq!(disc.pos, Vec2::new(40.0, 20.0));
    }

    #[test]
    fn test_wall_contacts() {
        let bounds = Bounds::new(0.0, 100.0, 0.0, 100.0);
        let contacts = bounds.wall_contacts(Vec2::new(95.0, 50.0), 8.0);
        assert!(contacts.right && !contacts.left && !contacts.y());
        assert!(!bounds.wall_contacts(Vec2::new(50.0, 50.0), 8.0).any());
    }
}
