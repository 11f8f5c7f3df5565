//! Opponent decision policy
//!
//! Each decision is a pure function of the current world plus the gameplay
//! RNG: score how dangerous the ball is, pick one of three modes, and emit a
//! target position, block/swing flags and a sword angle. Nothing carries over
//! between decisions except what the caller latches onto the combatant.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Bounds, segment_circle_roots};
use super::state::{Ball, Combatant};
use super::vector;
use crate::consts::BALL_MAX_SPEED;

/// Frames of ball motion simulated when scoring threat
pub const LOOKAHEAD_FRAMES: usize = 60;
/// Frames ahead used for the intercept point
const INTERCEPT_FRAMES: usize = 20;

/// Threat above this is defensive
pub const DEFENSIVE_THRESHOLD: f32 = 0.7;
/// Threat above this (and not defensive) is aggressive
pub const AGGRESSIVE_THRESHOLD: f32 = 0.3;

const PROXIMITY_WEIGHT: f32 = 0.5;
const SPEED_WEIGHT: f32 = 0.2;
const HEADING_WEIGHT: f32 = 0.3;

/// Predicted passes farther than this contribute no proximity threat
const THREAT_RANGE: f32 = 250.0;
/// "Close" for the stand-or-evade choice
const NEAR_RANGE: f32 = 150.0;
/// Blocking only pays off this close
const BLOCK_RANGE: f32 = 80.0;
/// How far an evasive sidestep aims
const EVADE_DISTANCE: f32 = 100.0;
/// Extra reach tolerated when an aggressive swing is considered
const SWING_MARGIN: f32 = 40.0;
/// Other combatants inside this radius push a positioning opponent away
const SEPARATION_RADIUS: f32 = 100.0;
/// Step length when backing out of a crowd
const AVOID_DISTANCE: f32 = 80.0;
/// Radius of the per-opponent offset around the arena center
const POSITION_JITTER: f32 = 100.0;
/// Golden angle, spreads per-opponent offsets evenly
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Behavior mode chosen from the threat score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    Defensive,
    Aggressive,
    #[default]
    Positioning,
}

impl Mode {
    pub fn from_threat(threat: f32) -> Self {
        if threat > DEFENSIVE_THRESHOLD {
            Mode::Defensive
        } else if threat > AGGRESSIVE_THRESHOLD {
            Mode::Aggressive
        } else {
            Mode::Positioning
        }
    }
}

/// One tick's worth of intent for an AI-driven combatant
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub mode: Mode,
    pub threat: f32,
    /// Always inside the arena (clamped for the combatant's radius)
    pub target_pos: Vec2,
    pub should_block: bool,
    pub should_swing: bool,
    pub aim_angle: f32,
}

/// Straight-line ball path with the simplified wall bounce (no jitter)
pub fn predict_trajectory(ball: &Ball, bounds: &Bounds, frames: usize) -> Vec<Vec2> {
    let mut pos = ball.pos;
    let mut vel = ball.vel;
    let r = ball.radius;
    let mut path = Vec::with_capacity(frames);

    for _ in 0..frames {
        pos += vel;
        if pos.x - r < bounds.left {
            vel.x = vel.x.abs();
        } else if pos.x + r > bounds.right {
            vel.x = -vel.x.abs();
        }
        if pos.y - r < bounds.top {
            vel.y = vel.y.abs();
        } else if pos.y + r > bounds.bottom {
            vel.y = -vel.y.abs();
        }
        pos = bounds.clamp_circle(pos, r);
        path.push(pos);
    }
    path
}

/// How dangerous the ball is to `me`, in [0, 1]
///
/// Mixes three signals: how close and how soon the predicted path comes to
/// us, how fast the ball is relative to max speed, and whether it is heading
/// our way right now.
pub fn threat_score(me: &Combatant, ball: &Ball, trajectory: &[Vec2]) -> f32 {
    let proximity = proximity_signal(me, ball, trajectory);
    let speed = (ball.speed / BALL_MAX_SPEED).clamp(0.0, 1.0);
    let to_me = vector::normalize(me.pos - ball.pos);
    let heading = ball.direction().dot(to_me).max(0.0);

    let score = PROXIMITY_WEIGHT * proximity + SPEED_WEIGHT * speed + HEADING_WEIGHT * heading;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn proximity_signal(me: &Combatant, ball: &Ball, trajectory: &[Vec2]) -> f32 {
    if trajectory.is_empty() {
        return 0.0;
    }
    let frames = trajectory.len() as f32;

    // Closest predicted approach, discounted the later it happens
    let (i_min, d_min) = trajectory
        .iter()
        .enumerate()
        .map(|(i, &p)| (i, vector::distance(p, me.pos)))
        .fold((0, f32::MAX), |best, cur| if cur.1 < best.1 { cur } else { best });
    let closeness = (1.0 - d_min / THREAT_RANGE).clamp(0.0, 1.0);
    let soonness = 1.0 - i_min as f32 / frames;
    let mut proximity = closeness * (0.5 + 0.5 * soonness);

    // A predicted body contact scores by how soon it lands
    let contact_radius = me.radius + ball.radius;
    let mut prev = ball.pos;
    for (i, &p) in trajectory.iter().enumerate() {
        if let Some((t0, _)) = segment_circle_roots(prev, p, me.pos, contact_radius) {
            let t_hit = (i as f32 + t0) / frames;
            proximity = proximity.max(1.0 - 0.5 * t_hit);
            break;
        }
        prev = p;
    }
    proximity.clamp(0.0, 1.0)
}

/// Decide what `me` should do this tick
///
/// `all` is every combatant in the round (including `me`, skipped by id).
pub fn decide(
    me: &Combatant,
    difficulty: f32,
    ball: &Ball,
    all: &[Combatant],
    bounds: &Bounds,
    rng: &mut impl Rng,
) -> Decision {
    let difficulty = difficulty.clamp(0.0, 1.0);
    let trajectory = predict_trajectory(ball, bounds, LOOKAHEAD_FRAMES);
    let threat = threat_score(me, ball, &trajectory);
    let mode = Mode::from_threat(threat);

    let mut decision = match mode {
        Mode::Defensive => defensive(me, difficulty, ball, rng),
        Mode::Aggressive => aggressive(me, difficulty, ball, all, &trajectory, rng),
        Mode::Positioning => positioning(me, ball, all, bounds),
    };
    decision.threat = threat;
    decision.target_pos = bounds.clamp_circle(decision.target_pos, me.radius);
    if !decision.aim_angle.is_finite() {
        decision.aim_angle = me.sword.angle;
    }
    decision.aim_angle = crate::normalize_angle(decision.aim_angle);
    decision
}

/// Stand and block/swing, or sidestep the ball's line
fn defensive(me: &Combatant, difficulty: f32, ball: &Ball, rng: &mut impl Rng) -> Decision {
    let dist = vector::distance(me.pos, ball.pos);
    let incoming = ball.vel.dot(me.pos - ball.pos) > 0.0;
    let reach = me.sword.length + ball.radius;
    let aim_angle = vector::angle_between(me.pos, ball.pos);

    if dist < NEAR_RANGE && incoming {
        // Skilled opponents hold their ground more often
        let commit_chance = 0.2 + 0.75 * difficulty;
        if rng.random::<f32>() < commit_chance {
            return Decision {
                mode: Mode::Defensive,
                threat: 0.0,
                target_pos: me.pos,
                should_block: dist < BLOCK_RANGE,
                should_swing: dist <= reach && rng.random::<f32>() < difficulty,
                aim_angle,
            };
        }
    }

    Decision {
        mode: Mode::Defensive,
        threat: 0.0,
        target_pos: me.pos + evade_direction(me, ball) * EVADE_DISTANCE,
        should_block: false,
        should_swing: false,
        aim_angle,
    }
}

/// Perpendicular to the ball's travel, on our side of its line
fn evade_direction(me: &Combatant, ball: &Ball) -> Vec2 {
    let away = vector::normalize(me.pos - ball.pos);
    let mut side = ball.direction().perp();
    if side == Vec2::ZERO {
        return away;
    }
    if side.dot(away) < 0.0 {
        side = -side;
    }
    side
}

/// Get in the ball's path and bat it at the weakest rival
fn aggressive(
    me: &Combatant,
    difficulty: f32,
    ball: &Ball,
    all: &[Combatant],
    trajectory: &[Vec2],
    rng: &mut impl Rng,
) -> Decision {
    let dist = vector::distance(me.pos, ball.pos);
    let reach = me.sword.length + ball.radius;

    let Some(rival) = pick_rival(me, all) else {
        return Decision {
            mode: Mode::Aggressive,
            threat: 0.0,
            target_pos: ball.pos,
            should_block: false,
            should_swing: false,
            aim_angle: vector::angle_between(me.pos, ball.pos),
        };
    };

    let predicted = trajectory
        .get(INTERCEPT_FRAMES.min(trajectory.len()).saturating_sub(1))
        .copied()
        .unwrap_or(ball.pos);
    let intercept = vector::lerp(ball.pos, predicted, 0.5);
    let target_pos = vector::lerp(intercept, me.pos, 0.3);

    let aim_angle = if dist <= reach + SWING_MARGIN {
        deflection_angle(me.pos, ball, rival.pos)
    } else {
        vector::angle_between(me.pos, ball.pos)
    };
    let swing_chance = 0.3 + 0.6 * difficulty;
    let should_swing = dist <= reach + SWING_MARGIN && rng.random::<f32>() < swing_chance;

    Decision {
        mode: Mode::Aggressive,
        threat: 0.0,
        target_pos,
        should_block: false,
        should_swing,
        aim_angle,
    }
}

/// Lowest-health living rival, nearest first on ties
fn pick_rival<'a>(me: &Combatant, all: &'a [Combatant]) -> Option<&'a Combatant> {
    all.iter()
        .filter(|c| c.alive && c.id != me.id)
        .min_by(|a, b| {
            a.health
                .total_cmp(&b.health)
                .then_with(|| {
                    vector::distance(me.pos, a.pos).total_cmp(&vector::distance(me.pos, b.pos))
                })
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// Blade angle whose mirror sends the ball from its current heading toward `rival`
///
/// Of the two blade orientations along the mirror line, the one pointing
/// closer to the ball is used so the blade actually sits in its path.
pub fn deflection_angle(pos: Vec2, ball: &Ball, rival: Vec2) -> f32 {
    let toward_ball = vector::angle_between(pos, ball.pos);
    let incoming = ball.direction();
    let outgoing = vector::normalize(rival - ball.pos);
    let normal = vector::normalize(outgoing - incoming);
    if normal == Vec2::ZERO {
        return toward_ball;
    }

    let blade = normal.perp();
    let to_ball = vector::normalize(ball.pos - pos);
    let blade = if blade.dot(to_ball) >= 0.0 { blade } else { -blade };
    blade.y.atan2(blade.x)
}

/// Drift toward a personal spot near the center, backing out of crowds
fn positioning(me: &Combatant, ball: &Ball, all: &[Combatant], bounds: &Bounds) -> Decision {
    let spot = bounds.center()
        + crate::polar_to_cartesian(POSITION_JITTER * 0.5, me.id as f32 * GOLDEN_ANGLE);

    let repulsion = all
        .iter()
        .filter(|c| c.alive && c.id != me.id)
        .filter_map(|c| {
            let away = me.pos - c.pos;
            let d = away.length();
            (d < SEPARATION_RADIUS).then(|| vector::normalize(away) * (1.0 - d / SEPARATION_RADIUS))
        })
        .fold(Vec2::ZERO, |acc, v| acc + v);

    let target_pos = if repulsion.length_squared() > 1e-6 {
        me.pos + vector::normalize(repulsion) * AVOID_DISTANCE
    } else {
        spot
    };

    Decision {
        mode: Mode::Positioning,
        threat: 0.0,
        target_pos,
        should_block: false,
        should_swing: false,
        aim_angle: vector::angle_between(me.pos, ball.pos),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SwordStats;
    use crate::consts::BALL_INITIAL_SPEED;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn bot(id: u32, pos: Vec2, difficulty: f32) -> Combatant {
        Combatant::opponent(id, pos, &SwordStats::default(), difficulty)
    }

    #[test]
    fn test_head_on_ball_is_defensive() {
        let bounds = Bounds::arena();
        let me = bot(1, bounds.center(), 0.5);
        let ball = Ball::new(me.pos - Vec2::new(60.0, 0.0), Vec2::new(8.0, 0.0));
        let traj = predict_trajectory(&ball, &bounds, LOOKAHEAD_FRAMES);
        let threat = threat_score(&me, &ball, &traj);
        assert!(threat > DEFENSIVE_THRESHOLD, "threat {threat}");

        let all = vec![me.clone()];
        let d = decide(&me, 0.5, &ball, &all, &bounds, &mut Pcg32::seed_from_u64(1));
        assert_eq!(d.mode, Mode::Defensive);
    }

    #[test]
    fn test_receding_far_ball_is_positioning() {
        let bounds = Bounds::arena();
        let me = bot(1, Vec2::new(200.0, 200.0), 0.5);
        let ball = Ball::new(Vec2::new(800.0, 500.0), Vec2::new(BALL_INITIAL_SPEED, 0.0));
        let all = vec![me.clone()];
        let d = decide(&me, 0.5, &ball, &all, &bounds, &mut Pcg32::seed_from_u64(1));
        assert_eq!(d.mode, Mode::Positioning);
        assert!(!d.should_block && !d.should_swing);
    }

    #[test]
    fn test_higher_difficulty_blocks_more() {
        let bounds = Bounds::arena();
        let trials = 2000;
        let mut blocks = [0u32; 2];

        for (slot, difficulty) in [0.1f32, 0.9].into_iter().enumerate() {
            let me = bot(1, bounds.center(), difficulty);
            let ball = Ball::new(me.pos - Vec2::new(50.0, 0.0), Vec2::new(6.0, 0.0));
            let all = vec![me.clone()];
            let mut rng = Pcg32::seed_from_u64(2024);
            for _ in 0..trials {
                let d = decide(&me, difficulty, &ball, &all, &bounds, &mut rng);
                assert_eq!(d.mode, Mode::Defensive);
                if d.should_block {
                    blocks[slot] += 1;
                }
            }
        }
        // Expected rates ~0.275 vs ~0.875
        assert!(blocks[1] > blocks[0] + trials / 4, "{blocks:?}");
    }

    #[test]
    fn test_swing_needs_reach() {
        let bounds = Bounds::arena();
        let me = bot(1, bounds.center(), 1.0);
        // Incoming, near, but outside sword reach
        let ball = Ball::new(me.pos - Vec2::new(120.0, 0.0), Vec2::new(9.0, 0.0));
        let all = vec![me.clone()];
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..200 {
            let d = defensive(&me, 1.0, &ball, &mut rng);
            assert!(!d.should_swing);
            assert!(!d.should_block);
        }
        let d = decide(&me, 1.0, &ball, &all, &bounds, &mut rng);
        assert!(!d.should_swing);
    }

    #[test]
    fn test_evade_is_perpendicular_to_ball() {
        let me = bot(1, Vec2::new(500.0, 320.0), 0.0);
        let ball = Ball::new(Vec2::new(300.0, 350.0), Vec2::new(5.0, 0.0));
        let dir = evade_direction(&me, &ball);
        assert!(dir.dot(ball.direction()).abs() < 1e-5);
        // We sit above the ball's line (smaller y), so sidestep upward
        assert!(dir.y < 0.0);
    }

    #[test]
    fn test_aggressive_targets_weakest_rival() {
        let me = bot(1, Vec2::new(500.0, 350.0), 0.5);
        let mut weak = bot(2, Vec2::new(900.0, 100.0), 0.5);
        weak.health = 20.0;
        let near = bot(3, Vec2::new(550.0, 350.0), 0.5);
        let mut dead = bot(4, Vec2::new(520.0, 350.0), 0.5);
        dead.health = 0.0;
        dead.alive = false;

        let all = vec![me.clone(), weak, near, dead];
        assert_eq!(pick_rival(&me, &all).map(|c| c.id), Some(2));
    }

    #[test]
    fn test_deflection_angle_mirrors_toward_rival() {
        let pos = Vec2::new(0.0, 0.0);
        // Ball coming straight down onto us, rival off to the right
        let ball = Ball::new(Vec2::new(0.0, -40.0), Vec2::new(0.0, 5.0));
        let rival = Vec2::new(400.0, -40.0);
        let angle = deflection_angle(pos, &ball, rival);

        let blade = Vec2::new(angle.cos(), angle.sin());
        let out = vector::reflect(ball.vel, blade.perp());
        let want = vector::normalize(rival - ball.pos);
        assert!(vector::normalize(out).dot(want) > 0.99);
        // Blade points toward the ball's side
        assert!(blade.dot(ball.pos - pos) > 0.0);
    }

    #[test]
    fn test_positioning_backs_out_of_crowd() {
        let bounds = Bounds::arena();
        let me = bot(1, Vec2::new(300.0, 300.0), 0.5);
        let crowd = bot(2, Vec2::new(330.0, 300.0), 0.5);
        let ball = Ball::new(Vec2::new(800.0, 600.0), Vec2::new(1.0, 0.0));
        let all = vec![me.clone(), crowd];
        let d = positioning(&me, &ball, &all, &bounds);
        assert!(d.target_pos.x < me.pos.x);
        assert!(!d.should_block && !d.should_swing);
    }

    #[test]
    fn test_positioning_spots_differ_per_opponent() {
        let bounds = Bounds::arena();
        let ball = Ball::new(Vec2::new(900.0, 600.0), Vec2::ZERO);
        let a = bot(1, Vec2::new(100.0, 100.0), 0.5);
        let b = bot(2, Vec2::new(100.0, 100.0), 0.5);
        let da = positioning(&a, &ball, &[], &bounds);
        let db = positioning(&b, &ball, &[], &bounds);
        assert!((da.target_pos - db.target_pos).length() > 10.0);
    }

    #[test]
    fn test_trajectory_stays_in_bounds() {
        let bounds = Bounds::arena();
        let ball = Ball::new(Vec2::new(960.0, 660.0), Vec2::new(14.0, 14.0));
        for p in predict_trajectory(&ball, &bounds, LOOKAHEAD_FRAMES) {
            assert!(bounds.contains(p));
        }
    }

    proptest! {
        #[test]
        fn decisions_stay_in_range(
            seed in any::<u64>(),
            difficulty in -0.5f32..1.5,
            mx in 0.0f32..1000.0, my in 0.0f32..700.0,
            bx in 0.0f32..1000.0, by in 0.0f32..700.0,
            vx in -15.0f32..15.0, vy in -15.0f32..15.0,
            ox in 0.0f32..1000.0, oy in 0.0f32..700.0,
        ) {
            let bounds = Bounds::arena();
            let me = bot(1, bounds.clamp_circle(Vec2::new(mx, my), 20.0), 0.5);
            let other = bot(2, Vec2::new(ox, oy), 0.5);
            let ball = Ball::new(Vec2::new(bx, by), Vec2::new(vx, vy));
            let all = vec![me.clone(), other];
            let mut rng = Pcg32::seed_from_u64(seed);
            let d = decide(&me, difficulty, &ball, &all, &bounds, &mut rng);

            prop_assert!((0.0..=1.0).contains(&d.threat));
            prop_assert_eq!(bounds.clamp_circle(d.target_pos, me.radius), d.target_pos);
            prop_assert!(d.aim_angle.is_finite());
            if d.mode == Mode::Positioning {
                prop_assert!(!d.should_block && !d.should_swing);
            }
        }
    }
}
