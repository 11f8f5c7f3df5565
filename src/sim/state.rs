//! Game state and core simulation types
//!
//! Everything a round needs lives in `GameState`, owned by whoever drives the
//! ticks. Phase functions borrow it mutably; nothing is global.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::Mode;
use super::collision::{Body, Bounds};
use super::vector;
use crate::catalog::{ItemCatalog, SwordStats};
use crate::consts::*;
use crate::polar_to_cartesian;
use crate::settings::Settings;

pub type EntityId = u32;

/// The human-controlled combatant always takes id 0
pub const HUMAN_ID: EntityId = 0;
/// The ball's id (never collides with a combatant id)
pub const BALL_ID: EntityId = u32::MAX;

/// Stream offset for the cosmetic RNG so particles never shift gameplay rolls
const FX_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Built, waiting for `start()`
    Ready,
    /// Active gameplay
    Playing,
    /// Ticking suspended, state preserved
    Paused,
    /// At most one combatant left standing (terminal until reset)
    RoundEnd,
}

/// A combatant's sword, resolved from the catalog at round start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sword {
    pub id: String,
    /// World-frame angle (radians)
    pub angle: f32,
    pub length: f32,
    pub width: f32,
    pub damage_multiplier: f32,
}

impl Sword {
    pub fn from_stats(stats: &SwordStats) -> Self {
        Self {
            id: stats.id.clone(),
            angle: 0.0,
            length: stats.length.max(0.0),
            width: stats.width.max(0.0),
            damage_multiplier: stats.damage_multiplier.max(0.0),
        }
    }

    /// Blade base: the wielder's center
    #[inline]
    pub fn base(&self, owner_pos: Vec2) -> Vec2 {
        owner_pos
    }

    #[inline]
    pub fn tip(&self, owner_pos: Vec2) -> Vec2 {
        owner_pos + polar_to_cartesian(self.length, self.angle)
    }
}

/// AI-only combatant state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opponent {
    /// Skill in [0, 1]
    pub difficulty: f32,
    /// Where the latest decision wants to go
    pub target_pos: Vec2,
    /// Seconds between decisions
    pub reaction_time: f32,
    /// Sim time of the latest decision
    pub last_decision: Option<f32>,
    /// Mode picked by the latest decision
    pub mode: Mode,
}

impl Opponent {
    pub fn new(difficulty: f32, start: Vec2) -> Self {
        let difficulty = difficulty.clamp(0.0, 1.0);
        Self {
            difficulty,
            target_pos: start,
            reaction_time: reaction_time_for(difficulty),
            last_decision: None,
            mode: Mode::Positioning,
        }
    }

    /// Whether the reaction interval has elapsed at `now`
    pub fn ready_to_decide(&self, now: f32) -> bool {
        self.last_decision
            .is_none_or(|last| now - last >= self.reaction_time)
    }
}

/// Decision interval in seconds: 0.3 at difficulty 0 down to 0.1 at difficulty 1
pub fn reaction_time_for(difficulty: f32) -> f32 {
    0.3 - 0.2 * difficulty.clamp(0.0, 1.0)
}

/// Movement speed multiplier for an opponent of the given difficulty
pub fn speed_scale_for(difficulty: f32) -> f32 {
    0.75 + 0.25 * difficulty.clamp(0.0, 1.0)
}

/// Who drives a combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CombatantKind {
    Human { skin_id: String },
    Opponent(Opponent),
}

/// A living (or fallen) participant: human or AI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub sword: Sword,
    /// Halves incoming damage (and movement speed) while set
    pub blocking: bool,
    /// Sim time of the last successful swing
    pub last_swing: Option<f32>,
    /// Movement intent for this tick (any length, normalized on use)
    pub move_dir: Vec2,
    /// Movement speed multiplier
    pub speed_scale: f32,
    pub kind: CombatantKind,
}

impl Combatant {
    fn new(id: EntityId, pos: Vec2, sword: &SwordStats, kind: CombatantKind) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: COMBATANT_RADIUS,
            health: COMBATANT_MAX_HEALTH,
            max_health: COMBATANT_MAX_HEALTH,
            alive: true,
            sword: Sword::from_stats(sword),
            blocking: false,
            last_swing: None,
            move_dir: Vec2::ZERO,
            speed_scale: 1.0,
            kind,
        }
    }

    pub fn human(pos: Vec2, sword: &SwordStats, skin_id: impl Into<String>) -> Self {
        let mut c = Self::new(
            HUMAN_ID,
            pos,
            sword,
            CombatantKind::Human { skin_id: skin_id.into() },
        );
        // Face up the arena toward the opponents
        c.sword.angle = -std::f32::consts::FRAC_PI_2;
        c
    }

    pub fn opponent(id: EntityId, pos: Vec2, sword: &SwordStats, difficulty: f32) -> Self {
        let opponent = Opponent::new(difficulty, pos);
        let mut c = Self::new(id, pos, sword, CombatantKind::Opponent(opponent));
        c.speed_scale = speed_scale_for(difficulty);
        c
    }

    pub fn is_human(&self) -> bool {
        matches!(self.kind, CombatantKind::Human { .. })
    }

    pub fn opponent_state(&self) -> Option<&Opponent> {
        match &self.kind {
            CombatantKind::Opponent(o) => Some(o),
            CombatantKind::Human { .. } => None,
        }
    }

    pub fn opponent_state_mut(&mut self) -> Option<&mut Opponent> {
        match &mut self.kind {
            CombatantKind::Opponent(o) => Some(o),
            CombatantKind::Human { .. } => None,
        }
    }

    pub fn skin_id(&self) -> Option<&str> {
        match &self.kind {
            CombatantKind::Human { skin_id } => Some(skin_id),
            CombatantKind::Opponent(_) => None,
        }
    }

    #[inline]
    pub fn sword_base(&self) -> Vec2 {
        self.sword.base(self.pos)
    }

    #[inline]
    pub fn sword_tip(&self) -> Vec2 {
        self.sword.tip(self.pos)
    }

    /// Point the sword at a world position (no-op if the target is our center)
    pub fn aim_at(&mut self, target: Vec2) {
        if !self.alive || !target.is_finite() || (target - self.pos).length_squared() < 1e-6 {
            return;
        }
        self.sword.angle = vector::angle_between(self.pos, target);
    }

    pub fn set_aim_angle(&mut self, angle: f32) {
        if self.alive && angle.is_finite() {
            self.sword.angle = crate::normalize_angle(angle);
        }
    }

    pub fn set_blocking(&mut self, blocking: bool) {
        if self.alive {
            self.blocking = blocking;
        }
    }

    /// Attempt a swing at sim time `now`. Succeeds only once the cooldown has
    /// elapsed since the last successful swing; dead combatants never swing.
    pub fn try_swing(&mut self, now: f32) -> bool {
        if !self.alive {
            return false;
        }
        if let Some(last) = self.last_swing {
            if now - last < SWORD_COOLDOWN {
                return false;
            }
        }
        self.last_swing = Some(now);
        true
    }

    /// Apply damage, halved while blocking. Returns true only on the call that
    /// kills; damage to a dead combatant is ignored.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive || amount.is_nan() || amount <= 0.0 {
            return false;
        }
        let damage = if self.blocking {
            amount * BLOCK_DAMAGE_FACTOR
        } else {
            amount
        };
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            self.blocking = false;
            self.vel = Vec2::ZERO;
            self.move_dir = Vec2::ZERO;
            return true;
        }
        false
    }

    /// Opponents: steer toward the latched target, stopping when close
    pub fn steer_to_target(&mut self) {
        let Some(target) = self.opponent_state().map(|o| o.target_pos) else {
            return;
        };
        let to_target = target - self.pos;
        self.move_dir = if to_target.length() > ARRIVE_DISTANCE {
            vector::normalize(to_target)
        } else {
            Vec2::ZERO
        };
    }

    /// Integrate one step of movement and keep the body inside the arena
    pub fn integrate(&mut self, dt: f32, bounds: &Bounds) {
        if !self.alive {
            return;
        }
        let dir = vector::normalize(self.move_dir);
        let mut speed = MOVE_SPEED * self.speed_scale;
        if self.blocking {
            speed *= BLOCK_MOVE_FACTOR;
        }
        self.vel = dir * speed;
        self.pos += self.vel * crate::frame_scale(dt);
        super::collision::clamp_to_bounds(self, bounds);
    }
}

impl Body for Combatant {
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

/// The single, immortal ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: EntityId,
    pub pos: Vec2,
    /// Always `direction * speed`; only mutate through `set_velocity`
    pub vel: Vec2,
    pub radius: f32,
    /// Cached |vel|, always within [0, BALL_MAX_SPEED]
    pub speed: f32,
    /// Combatant whose sword or body touched the ball most recently
    pub last_hit_by: Option<EntityId>,
    /// Ticks left during which `last_hit_by` cannot touch the ball again
    pub contact_cooldown: u32,
    /// Recent positions for rendering (newest first)
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        let mut ball = Self {
            id: BALL_ID,
            pos,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            speed: 0.0,
            last_hit_by: None,
            contact_cooldown: 0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        };
        ball.set_velocity(vel);
        ball
    }

    /// Serve from `pos` in a random direction at the initial speed
    pub fn launch(pos: Vec2, rng: &mut impl Rng) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        Self::new(pos, polar_to_cartesian(BALL_INITIAL_SPEED, angle))
    }

    /// Replace the velocity, clamping speed into [0, BALL_MAX_SPEED]
    pub fn set_velocity(&mut self, vel: Vec2) {
        let dir = vector::normalize(vel);
        let speed = if dir == Vec2::ZERO {
            0.0
        } else {
            vel.length().clamp(0.0, BALL_MAX_SPEED)
        };
        self.speed = speed;
        self.vel = dir * speed;
    }

    /// Direction and magnitude set separately (magnitude clamped)
    pub fn set_heading(&mut self, direction: Vec2, speed: f32) {
        self.set_velocity(vector::normalize(direction) * speed.max(0.0));
    }

    /// Unit direction of travel (zero when at rest)
    pub fn direction(&self) -> Vec2 {
        vector::normalize(self.vel)
    }

    /// Record current position to trail
    pub fn record_trail(&mut self) {
        self.trail.push_front(self.pos);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_back();
        }
    }

    /// Whether `id` is still inside its post-contact grace window
    pub fn ignores(&self, id: EntityId) -> bool {
        self.contact_cooldown > 0 && self.last_hit_by == Some(id)
    }

    pub fn mark_contact(&mut self, id: EntityId) {
        self.last_hit_by = Some(id);
        self.contact_cooldown = CONTACT_COOLDOWN_TICKS;
    }
}

impl Body for Ball {
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

/// What the renderer/audio layer may react to; cleared at the start of every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A swing request went through the cooldown
    Swing { id: EntityId },
    /// The ball came off a sword
    SwordDeflect { owner: EntityId, point: Vec2 },
    /// The ball struck a body
    BodyHit { target: EntityId, damage: f32, point: Vec2 },
    /// A combatant's health reached zero
    Death { id: EntityId, pos: Vec2 },
    /// The ball bounced off an arena wall
    WallBounce { point: Vec2 },
    /// The round just ended
    RoundEnded { human_survived: bool },
}

/// Particle flavours (renderer picks colours)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Hit,
    Death,
    Swing,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    /// Combatant whose sword/skin tints the particle, if any
    pub source: Option<EntityId>,
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1 at birth, 0 at expiry
    pub life: f32,
    /// Lifetime in seconds
    pub max_life: f32,
    pub size: f32,
}

/// Maximum particles
pub const MAX_PARTICLES: usize = 256;

/// Everything resolved from settings + catalog for one round
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub sword: SwordStats,
    pub skin_id: String,
    pub opponent_sword: SwordStats,
    /// Opponent skill in [0, 1]
    pub difficulty: f32,
    pub opponent_count: usize,
    pub bounds: Bounds,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), &ItemCatalog::builtin())
    }
}

impl RoundConfig {
    pub fn from_settings(settings: &Settings, catalog: &ItemCatalog) -> Self {
        Self {
            sword: catalog.sword(&settings.equipped_sword),
            skin_id: settings.equipped_skin.clone(),
            opponent_sword: catalog.swords.first().cloned().unwrap_or_default(),
            difficulty: settings.difficulty.scalar(),
            opponent_count: OPPONENT_COUNT,
            bounds: Bounds::arena(),
        }
    }

    pub fn with_opponents(mut self, count: usize) -> Self {
        self.opponent_count = count;
        self
    }
}

/// Complete round state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Round seed for reproducibility
    pub seed: u64,
    /// Gameplay RNG (wall jitter, AI rolls, serve direction)
    pub rng: Pcg32,
    /// Cosmetic RNG (particles only)
    pub fx_rng: Pcg32,
    pub config: RoundConfig,
    pub bounds: Bounds,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Human first, then opponents in id order
    pub combatants: Vec<Combatant>,
    pub ball: Ball,
    /// Living combatants; decremented exactly once per death
    pub remaining_alive: u32,
    /// Set on the transition into `RoundEnd`
    pub human_survived: Option<bool>,
    /// Events raised during the latest tick
    pub events: Vec<GameEvent>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
}

impl GameState {
    /// Build a fresh round
    pub fn new(config: RoundConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let fx_rng = Pcg32::seed_from_u64(seed ^ FX_STREAM_SALT);
        let bounds = config.bounds;

        let mut combatants = Vec::with_capacity(config.opponent_count + 1);
        combatants.push(Combatant::human(
            human_spawn(&bounds),
            &config.sword,
            config.skin_id.clone(),
        ));
        for (i, pos) in opponent_spawns(&bounds, config.opponent_count)
            .into_iter()
            .enumerate()
        {
            let mut c = Combatant::opponent(
                i as EntityId + 1,
                pos,
                &config.opponent_sword,
                config.difficulty,
            );
            c.aim_at(bounds.center());
            combatants.push(c);
        }

        let ball = Ball::launch(bounds.center(), &mut rng);
        let remaining_alive = combatants.len() as u32;

        Self {
            seed,
            rng,
            fx_rng,
            config,
            bounds,
            time_ticks: 0,
            phase: GamePhase::Ready,
            combatants,
            ball,
            remaining_alive,
            human_survived: None,
            events: Vec::new(),
            particles: Vec::new(),
        }
    }

    /// Simulation clock in seconds
    pub fn now(&self) -> f32 {
        self.time_ticks as f32 * SIM_DT
    }

    pub fn human(&self) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.is_human())
    }

    pub fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn living(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| c.alive)
    }

    /// Burst of particles where the ball struck something
    pub fn spawn_hit_particles(&mut self, pos: Vec2, source: Option<EntityId>) {
        let count = self.fx_rng.random_range(8..13);
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32
                + self.fx_rng.random_range(-0.25..0.25);
            let speed = self.fx_rng.random_range(2.0..5.0);
            let particle = Particle {
                kind: ParticleKind::Hit,
                source,
                pos,
                vel: polar_to_cartesian(speed, angle),
                life: 1.0,
                max_life: self.fx_rng.random_range(0.5..0.8),
                size: self.fx_rng.random_range(3.0..6.0),
            };
            self.push_particle(particle);
        }
    }

    /// Larger burst where a combatant fell
    pub fn spawn_death_particles(&mut self, pos: Vec2, source: EntityId) {
        let count = self.fx_rng.random_range(20..35);
        for _ in 0..count {
            let angle = self.fx_rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.fx_rng.random_range(3.0..8.0);
            let particle = Particle {
                kind: ParticleKind::Death,
                source: Some(source),
                pos,
                vel: polar_to_cartesian(speed, angle),
                life: 1.0,
                max_life: self.fx_rng.random_range(0.8..1.3),
                size: self.fx_rng.random_range(4.0..8.0),
            };
            self.push_particle(particle);
        }
    }

    /// Streak along the blade on a successful swing
    pub fn spawn_swing_particles(&mut self, base: Vec2, tip: Vec2, source: EntityId) {
        const COUNT: usize = 5;
        for i in 0..COUNT {
            let t = i as f32 / COUNT as f32;
            let vel = Vec2::new(
                self.fx_rng.random_range(-1.0..1.0),
                self.fx_rng.random_range(-1.0..1.0),
            );
            let particle = Particle {
                kind: ParticleKind::Swing,
                source: Some(source),
                pos: vector::lerp(base, tip, t),
                vel,
                life: 1.0,
                max_life: self.fx_rng.random_range(0.2..0.4),
                size: self.fx_rng.random_range(2.0..4.0),
            };
            self.push_particle(particle);
        }
    }

    fn push_particle(&mut self, particle: Particle) {
        if self.particles.len() >= MAX_PARTICLES {
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }

    /// Owned, read-only view for rendering
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.time_ticks,
            phase: self.phase,
            remaining_alive: self.remaining_alive,
            combatants: self
                .combatants
                .iter()
                .map(|c| CombatantView {
                    id: c.id,
                    is_human: c.is_human(),
                    pos: c.pos,
                    radius: c.radius,
                    health: c.health,
                    max_health: c.max_health,
                    alive: c.alive,
                    blocking: c.blocking,
                    sword_id: c.sword.id.clone(),
                    sword_angle: c.sword.angle,
                    sword_base: c.sword_base(),
                    sword_tip: c.sword_tip(),
                    sword_width: c.sword.width,
                    skin_id: c.skin_id().map(str::to_owned),
                })
                .collect(),
            ball: BallView {
                pos: self.ball.pos,
                radius: self.ball.radius,
                speed: self.ball.speed,
                trail: self.ball.trail.iter().copied().collect(),
            },
            particles: self.particles.clone(),
            events: self.events.clone(),
        }
    }
}

/// Human spawn point: bottom middle of the arena
pub fn human_spawn(bounds: &Bounds) -> Vec2 {
    bounds.clamp_circle(
        Vec2::new(bounds.center().x, bounds.bottom - 80.0),
        COMBATANT_RADIUS,
    )
}

/// Opponent spawn points: the four corners first, then a ring around the center
pub fn opponent_spawns(bounds: &Bounds, count: usize) -> Vec<Vec2> {
    let corners = [
        Vec2::new(bounds.left + 180.0, bounds.top + 130.0),
        Vec2::new(bounds.right - 180.0, bounds.top + 130.0),
        Vec2::new(bounds.left + 180.0, bounds.bottom - 130.0),
        Vec2::new(bounds.right - 180.0, bounds.bottom - 130.0),
    ];
    let ring_radius = bounds.width().min(bounds.height()) * 0.35;
    (0..count)
        .map(|i| {
            let pos = corners.get(i).copied().unwrap_or_else(|| {
                let angle = std::f32::consts::TAU * (i - corners.len()) as f32
                    / (count - corners.len()) as f32;
                bounds.center() + polar_to_cartesian(ring_radius, angle)
            });
            bounds.clamp_circle(pos, COMBATANT_RADIUS)
        })
        .collect()
}

/// Read-only per-tick render data
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub remaining_alive: u32,
    pub combatants: Vec<CombatantView>,
    pub ball: BallView,
    pub particles: Vec<Particle>,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatantView {
    pub id: EntityId,
    pub is_human: bool,
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub blocking: bool,
    pub sword_id: String,
    pub sword_angle: f32,
    pub sword_base: Vec2,
    pub sword_tip: Vec2,
    pub sword_width: f32,
    pub skin_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BallView {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub trail: Vec<Vec2>,
}
