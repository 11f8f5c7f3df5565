//! Sword Arena - a 2D arena brawler where swords bat a single ball around
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, physics, collisions, opponent AI)
//! - `engine`: Round lifecycle and fixed-timestep driver
//! - `input`: Raw keyboard/pointer state and per-tick input snapshots
//! - `catalog`: Sword and skin stat tables
//! - `settings`: Difficulty presets and equipped items

pub mod catalog;
pub mod engine;
pub mod input;
pub mod settings;
pub mod sim;

pub use catalog::{ItemCatalog, SkinItem, SwordStats};
pub use engine::{Engine, RoundOutcome};
pub use input::{InputSnapshot, InputSource, RawInput};
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (seconds)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Reference frame length that speeds are expressed against
    pub const REFERENCE_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the driver will account for (tab switches, debugger stops)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1000.0;
    pub const ARENA_HEIGHT: f32 = 700.0;
    pub const ARENA_PADDING: f32 = 20.0;

    /// Combatant defaults
    pub const COMBATANT_RADIUS: f32 = 20.0;
    pub const COMBATANT_MAX_HEALTH: f32 = 100.0;
    /// Movement speed (pixels per reference frame)
    pub const MOVE_SPEED: f32 = 4.0;
    /// Movement speed factor while blocking
    pub const BLOCK_MOVE_FACTOR: f32 = 0.5;
    /// Incoming damage factor while blocking
    pub const BLOCK_DAMAGE_FACTOR: f32 = 0.5;
    /// Opponents stop steering when this close to their target
    pub const ARRIVE_DISTANCE: f32 = 5.0;

    /// Sword defaults (used when the catalog has no entry)
    pub const SWORD_BASE_LENGTH: f32 = 60.0;
    pub const SWORD_BASE_WIDTH: f32 = 10.0;
    /// Minimum time between successful swings (seconds)
    pub const SWORD_COOLDOWN: f32 = 0.5;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_INITIAL_SPEED: f32 = 5.0;
    pub const BALL_MAX_SPEED: f32 = 15.0;
    /// Speed boost on every body/sword contact (multiplicative)
    pub const BALL_ACCELERATION: f32 = 1.05;
    /// Extra gap left between ball and whatever it was pushed out of
    pub const SEPARATION_MARGIN: f32 = 2.0;
    /// Max wall-bounce perturbation, as a fraction of speed on the other axis
    pub const WALL_JITTER: f32 = 0.05;
    /// Ticks during which the ball ignores the combatant it last touched
    pub const CONTACT_COOLDOWN_TICKS: u32 = 6;
    /// Number of trail points kept for rendering
    pub const TRAIL_LENGTH: usize = 10;

    /// Damage dealt by one ball-body impact
    pub const DAMAGE_PER_HIT: f32 = 10.0;

    /// AI opponents per round
    pub const OPPONENT_COUNT: usize = 3;

    /// Delay between the final hit and the round outcome being reported (seconds)
    pub const ROUND_END_DELAY: f32 = 1.0;
    /// Coins awarded to the human for winning a round
    pub const ROUND_WIN_REWARD: u32 = 50;
}

/// Scale factor from a timestep to reference frames
#[inline]
pub fn frame_scale(dt: f32) -> f32 {
    dt / consts::REFERENCE_DT
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
