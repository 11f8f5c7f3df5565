//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod physics;
pub mod state;
pub mod tick;
pub mod vector;

pub use ai::{Decision, Mode};
pub use collision::{Body, Bounds, CollisionResult, segment_circle_intersect};
pub use state::{
    Ball, Combatant, CombatantKind, EntityId, GameEvent, GamePhase, GameState, HUMAN_ID,
    Particle, ParticleKind, RoundConfig, Snapshot,
};
pub use tick::tick;
