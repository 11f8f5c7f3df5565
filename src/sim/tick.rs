//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. The step order
//! inside `tick` is fixed: later steps read what earlier ones wrote.

use glam::Vec2;

use super::ai;
use super::collision::{circle_overlap, segment_circle_intersect};
use super::physics;
use super::state::{GameEvent, GamePhase, GameState};
use super::vector;
use crate::consts::*;
use crate::input::InputSnapshot;

/// Skill the autopilot plays the human with
pub const AUTOPILOT_SKILL: f32 = 0.8;

/// Particle velocity decay per reference frame
const PARTICLE_DRAG: f32 = 0.95;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &InputSnapshot, dt: f32) {
    state.events.clear();

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", state.time_ticks);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed at tick {}", state.time_ticks);
            }
            _ => {}
        }
    }

    // Don't tick unless a round is live
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    apply_human_input(state, input);
    run_opponent_decisions(state);
    move_combatants(state, dt);
    move_ball(state, dt);
    resolve_ball_contacts(state);
    update_particles(state, dt);
    check_round_end(state);
}

/// Step 1: the human's intent, from the snapshot or the autopilot
fn apply_human_input(state: &mut GameState, input: &InputSnapshot) {
    let Some(idx) = state.combatants.iter().position(|c| c.is_human()) else {
        return;
    };
    if !state.combatants[idx].alive {
        return;
    }
    let now = state.now();

    if input.autopilot {
        let decision = ai::decide(
            &state.combatants[idx],
            AUTOPILOT_SKILL,
            &state.ball,
            &state.combatants,
            &state.bounds,
            &mut state.rng,
        );
        let human = &mut state.combatants[idx];
        let to_target = decision.target_pos - human.pos;
        human.move_dir = if to_target.length() > ARRIVE_DISTANCE {
            vector::normalize(to_target)
        } else {
            Vec2::ZERO
        };
        human.set_aim_angle(decision.aim_angle);
        human.set_blocking(decision.should_block);
        if decision.should_swing {
            perform_swing(state, idx, now);
        }
        return;
    }

    let human = &mut state.combatants[idx];
    human.move_dir = if input.move_intent.is_finite() {
        input.move_intent
    } else {
        Vec2::ZERO
    };
    if let Some(aim) = input.aim {
        human.aim_at(aim);
    }
    human.set_blocking(input.block);
    if input.swing {
        perform_swing(state, idx, now);
    }
}

/// Step 2: opponents whose reaction interval elapsed decide and latch
fn run_opponent_decisions(state: &mut GameState) {
    let now = state.now();

    for idx in 0..state.combatants.len() {
        let c = &state.combatants[idx];
        let Some(opponent) = c.opponent_state() else {
            continue;
        };
        if !c.alive || !opponent.ready_to_decide(now) {
            continue;
        }

        let decision = ai::decide(
            c,
            opponent.difficulty,
            &state.ball,
            &state.combatants,
            &state.bounds,
            &mut state.rng,
        );

        let c = &mut state.combatants[idx];
        let id = c.id;
        if let Some(opponent) = c.opponent_state_mut() {
            if opponent.mode != decision.mode {
                log::debug!(
                    "Opponent {id} {:?} -> {:?} (threat {:.2})",
                    opponent.mode,
                    decision.mode,
                    decision.threat
                );
            }
            opponent.mode = decision.mode;
            opponent.target_pos = decision.target_pos;
            opponent.last_decision = Some(now);
        }
        c.set_aim_angle(decision.aim_angle);
        c.set_blocking(decision.should_block);
        if decision.should_swing {
            perform_swing(state, idx, now);
        }
    }
}

fn perform_swing(state: &mut GameState, idx: usize, now: f32) {
    let c = &mut state.combatants[idx];
    if !c.try_swing(now) {
        return;
    }
    let (id, base, tip) = (c.id, c.sword_base(), c.sword_tip());
    state.events.push(GameEvent::Swing { id });
    state.spawn_swing_particles(base, tip, id);
}

/// Step 3: integrate every living combatant and clamp it into the arena
fn move_combatants(state: &mut GameState, dt: f32) {
    let bounds = state.bounds;
    for c in state.combatants.iter_mut().filter(|c| c.alive) {
        c.steer_to_target();
        c.integrate(dt, &bounds);
    }
}

/// Step 4: ball integration and wall bounce
fn move_ball(state: &mut GameState, dt: f32) {
    physics::integrate_ball(&mut state.ball, dt);
    if physics::wall_bounce(&mut state.ball, &state.bounds, &mut state.rng) {
        state.events.push(GameEvent::WallBounce {
            point: state.ball.pos,
        });
    }
}

/// Step 5: sword and body contacts, in id order
///
/// A sword contact suppresses a body contact against the same combatant in
/// the same tick. While the contact cooldown runs, the combatant that touched
/// the ball last still blocks it bodily but takes no damage and gets no sword
/// contact.
fn resolve_ball_contacts(state: &mut GameState) {
    for idx in 0..state.combatants.len() {
        let c = &state.combatants[idx];
        if !c.alive {
            continue;
        }
        let id = c.id;

        if state.ball.ignores(id) {
            if circle_overlap(&state.ball, c) {
                physics::push_off_body(&mut state.ball, c);
                state.ball.mark_contact(id);
            }
            continue;
        }

        let contact = segment_circle_intersect(
            c.sword_base(),
            c.sword_tip(),
            state.ball.pos,
            state.ball.radius,
        );
        if contact.hit {
            physics::reflect_off_sword(&mut state.ball, c, &contact);
            state.events.push(GameEvent::SwordDeflect {
                owner: id,
                point: contact.point,
            });
            state.spawn_hit_particles(contact.point, Some(id));
            continue;
        }

        if !circle_overlap(&state.ball, c) {
            continue;
        }
        let point = c.pos + vector::normalize(state.ball.pos - c.pos) * c.radius;
        physics::reflect_off_body(&mut state.ball, c);
        state.ball.mark_contact(id);

        let c = &mut state.combatants[idx];
        let before = c.health;
        let killed = c.take_damage(DAMAGE_PER_HIT);
        let (damage, pos) = (before - c.health, c.pos);

        state.events.push(GameEvent::BodyHit {
            target: id,
            damage,
            point,
        });
        state.spawn_hit_particles(point, None);

        if killed {
            state.remaining_alive = state.remaining_alive.saturating_sub(1);
            state.events.push(GameEvent::Death { id, pos });
            state.spawn_death_particles(pos, id);
            log::debug!(
                "Combatant {id} eliminated at tick {} ({} left)",
                state.time_ticks,
                state.remaining_alive
            );
        }
    }

    // Pushing off a body near a wall can shove the ball through it
    state.ball.pos = state
        .bounds
        .clamp_circle(state.ball.pos, state.ball.radius);
}

/// Step 6: visual-only particle motion and expiry
fn update_particles(state: &mut GameState, dt: f32) {
    let scale = crate::frame_scale(dt);
    let drag = PARTICLE_DRAG.powf(scale);
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel * scale;
        particle.vel *= drag;
        particle.life -= dt / particle.max_life.max(f32::EPSILON);
        particle.size *= 0.98;
    }
    state.particles.retain(|p| p.life > 0.0);
}

/// Step 7: end the round once at most one combatant stands
fn check_round_end(state: &mut GameState) {
    if state.remaining_alive > 1 {
        return;
    }
    let human_survived = state.human().is_some_and(|h| h.alive);
    state.phase = GamePhase::RoundEnd;
    state.human_survived = Some(human_survived);
    state.events.push(GameEvent::RoundEnded { human_survived });
    log::info!(
        "Round over after {} ticks: human {}",
        state.time_ticks,
        if human_survived { "survived" } else { "lost" }
    );
}
