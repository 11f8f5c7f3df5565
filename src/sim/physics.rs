//! Ball response: integration, wall bounce, body and sword deflection
//!
//! Every velocity change goes through `Ball::set_velocity` / `set_heading`,
//! which re-clamps speed into [0, BALL_MAX_SPEED].

use glam::Vec2;
use rand::Rng;

use super::collision::{Bounds, CollisionResult, circle_overlap};
use super::state::{Ball, Combatant};
use super::vector;
use crate::consts::*;

/// Advance the ball along its velocity and record the trail
pub fn integrate_ball(ball: &mut Ball, dt: f32) {
    ball.pos += ball.vel * crate::frame_scale(dt);
    ball.record_trail();
    ball.contact_cooldown = ball.contact_cooldown.saturating_sub(1);
}

/// Bounce the ball off any wall its leading edge has crossed
///
/// The crossing velocity component is flipped so it points back into the
/// arena, the position is clamped inside, and the other axis gets a small
/// random nudge. Speed is restored to its pre-bounce value afterwards, so a
/// wall never adds or removes energy. Returns true if a bounce happened.
pub fn wall_bounce(ball: &mut Ball, bounds: &Bounds, rng: &mut impl Rng) -> bool {
    let r = ball.radius;
    let speed = ball.speed;
    let contacts = bounds.wall_contacts(ball.pos, r);
    if !contacts.any() {
        return false;
    }

    let mut vel = ball.vel;
    if contacts.left {
        vel.x = vel.x.abs();
    } else if contacts.right {
        vel.x = -vel.x.abs();
    }
    if contacts.top {
        vel.y = vel.y.abs();
    } else if contacts.bottom {
        vel.y = -vel.y.abs();
    }
    let pos = bounds.clamp_circle(ball.pos, r);

    // Jitter the axis that did not bounce (a corner hit jitters neither)
    let jitter = speed * WALL_JITTER;
    if contacts.x() && !contacts.y() {
        vel.y += rng.random_range(-jitter..=jitter);
    } else if contacts.y() && !contacts.x() {
        vel.x += rng.random_range(-jitter..=jitter);
    }

    ball.pos = pos;
    ball.set_heading(vel, speed);
    true
}

/// Bounce the ball off a combatant's body circle
///
/// Separates and reflects like `push_off_body`, then speeds the ball up by
/// `BALL_ACCELERATION`.
pub fn reflect_off_body(ball: &mut Ball, body: &Combatant) {
    push_off_body(ball, body);
    let speed = (ball.speed * BALL_ACCELERATION).min(BALL_MAX_SPEED);
    ball.set_heading(ball.vel, speed);
}

/// Move the ball just outside a body circle, reflecting it if it was moving
/// inward. Speed is unchanged.
pub fn push_off_body(ball: &mut Ball, body: &Combatant) {
    let mut normal = vector::normalize(ball.pos - body.pos);
    if normal == Vec2::ZERO {
        // Concentric: send it back where it came from
        normal = -ball.direction();
        if normal == Vec2::ZERO {
            normal = Vec2::NEG_Y;
        }
    }

    let mut vel = ball.vel;
    if vel.dot(normal) < 0.0 {
        vel = vector::reflect(vel, normal);
    }
    ball.pos = body.pos + normal * (body.radius + ball.radius + SEPARATION_MARGIN);
    ball.set_heading(vel, ball.speed);
}

/// Bounce the ball off a sword segment
///
/// The reflection normal is the blade's perpendicular, oriented toward the
/// ball. Speed becomes `min(speed * BALL_ACCELERATION * damage_multiplier,
/// BALL_MAX_SPEED)`, the ball is pushed off the blade by its radius plus a
/// margin, and the owner is remembered as the last hitter. The blade starts
/// inside the owner's body, so a contact near the hilt also pushes the ball
/// clear of the body.
pub fn reflect_off_sword(ball: &mut Ball, owner: &Combatant, contact: &CollisionResult) {
    let blade = owner.sword_tip() - owner.sword_base();
    let mut normal = vector::normalize(blade.perp());
    if normal == Vec2::ZERO {
        // Zero-length blade: treat it as a point
        normal = contact.normal;
    }
    if normal.dot(ball.pos - contact.point) < 0.0 {
        normal = -normal;
    }

    let mut vel = ball.vel;
    if vel.dot(normal) < 0.0 {
        vel = vector::reflect(vel, normal);
    }
    let speed = (ball.speed * BALL_ACCELERATION * owner.sword.damage_multiplier)
        .min(BALL_MAX_SPEED);

    ball.pos = contact.point + normal * (ball.radius + SEPARATION_MARGIN);
    ball.set_heading(vel, speed);
    if circle_overlap(&*ball, owner) {
        push_off_body(ball, owner);
    }
    ball.mark_contact(owner.id);
}
