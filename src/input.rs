//! Input sampling
//!
//! The host forwards raw keyboard, mouse and touch events into `RawInput`;
//! the engine calls `sample()` once per tick and hands the resulting
//! `InputSnapshot` to the simulation. The snapshot is plain data and never
//! aliases the raw state.

use std::collections::VecDeque;

use glam::Vec2;

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Movement intent from directional keys (any length, normalized on use)
    pub move_intent: Vec2,
    /// Aim target in arena coordinates (pointer/touch position)
    pub aim: Option<Vec2>,
    /// Block held
    pub block: bool,
    /// Swing requested (held counts; the sword cooldown gates repeats)
    pub swing: bool,
    /// Pause toggle (edge: true for one sample per press)
    pub pause: bool,
    /// Idle/demo mode - the AI plays the human
    pub autopilot: bool,
}

/// Anything that can produce one snapshot per tick
pub trait InputSource {
    fn sample(&mut self) -> InputSnapshot;

    /// Drop held state and stop producing input (called on destroy)
    fn release(&mut self) {}
}

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
    E,
    Escape,
}

impl Key {
    /// Map a DOM-style key name (case-insensitive) to a game key
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "w" => Some(Key::W),
            "a" => Some(Key::A),
            "s" => Some(Key::S),
            "d" => Some(Key::D),
            "arrowup" | "up" => Some(Key::Up),
            "arrowdown" | "down" => Some(Key::Down),
            "arrowleft" | "left" => Some(Key::Left),
            "arrowright" | "right" => Some(Key::Right),
            " " | "space" | "spacebar" => Some(Key::Space),
            "e" => Some(Key::E),
            "escape" | "esc" => Some(Key::Escape),
            _ => None,
        }
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }

    /// Whether the host should suppress the browser default for this key
    pub fn is_game_key(self) -> bool {
        matches!(self, Key::W | Key::A | Key::S | Key::D | Key::Space | Key::E)
    }
}

/// Mouse buttons the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button: swing
    Primary,
    /// Right button: block
    Secondary,
}

impl PointerButton {
    /// DOM `MouseEvent.button` index (0 = left, 2 = right)
    pub fn from_index(index: i16) -> Option<Self> {
        match index {
            0 => Some(PointerButton::Primary),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

/// Maps client (CSS pixel) coordinates onto the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Top-left of the drawing surface in client coordinates
    pub origin: Vec2,
    /// Displayed size in client coordinates
    pub size: Vec2,
    /// Logical arena size the surface renders
    pub arena: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        let arena = Vec2::new(ARENA_WIDTH, ARENA_HEIGHT);
        Self {
            origin: Vec2::ZERO,
            size: arena,
            arena,
        }
    }
}

impl Viewport {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self {
            origin,
            size,
            ..Default::default()
        }
    }

    /// Client position to arena position (identity scale if the surface has no size)
    pub fn to_arena(&self, client: Vec2) -> Vec2 {
        let scale = Vec2::new(
            if self.size.x > 0.0 { self.arena.x / self.size.x } else { 1.0 },
            if self.size.y > 0.0 { self.arena.y / self.size.y } else { 1.0 },
        );
        (client - self.origin) * scale
    }
}

/// Raw device state, fed by host event handlers
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    held: u16,
    pointer: Option<Vec2>,
    primary: bool,
    secondary: bool,
    viewport: Viewport,
    autopilot: bool,
    /// Escape state at the previous sample, for edge detection
    escape_was_down: bool,
    released: bool,
}

impl RawInput {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.autopilot = on;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held & key.bit() != 0
    }

    /// Returns whether the key is one the game consumes
    pub fn key_down(&mut self, name: &str) -> bool {
        match Key::from_name(name) {
            Some(key) if !self.released => {
                self.held |= key.bit();
                key.is_game_key()
            }
            _ => false,
        }
    }

    pub fn key_up(&mut self, name: &str) {
        if let Some(key) = Key::from_name(name) {
            self.held &= !key.bit();
        }
    }

    pub fn pointer_move(&mut self, client: Vec2) {
        if !self.released {
            self.pointer = Some(self.viewport.to_arena(client));
        }
    }

    pub fn pointer_down(&mut self, button: PointerButton, client: Vec2) {
        if self.released {
            return;
        }
        if self.pointer.is_none() {
            self.pointer_move(client);
        }
        match button {
            PointerButton::Primary => self.primary = true,
            PointerButton::Secondary => self.secondary = true,
        }
    }

    pub fn pointer_up(&mut self, button: PointerButton) {
        match button {
            PointerButton::Primary => self.primary = false,
            PointerButton::Secondary => self.secondary = false,
        }
    }

    /// A touch aims and swings
    pub fn touch_start(&mut self, client: Vec2) {
        if self.released {
            return;
        }
        self.pointer = Some(self.viewport.to_arena(client));
        self.primary = true;
        self.secondary = false;
    }

    pub fn touch_move(&mut self, client: Vec2) {
        if self.pointer.is_some() {
            self.pointer_move(client);
        }
    }

    pub fn touch_end(&mut self) {
        self.primary = false;
    }

    fn move_intent(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.is_down(Key::W) || self.is_down(Key::Up) {
            dir.y -= 1.0;
        }
        if self.is_down(Key::S) || self.is_down(Key::Down) {
            dir.y += 1.0;
        }
        if self.is_down(Key::A) || self.is_down(Key::Left) {
            dir.x -= 1.0;
        }
        if self.is_down(Key::D) || self.is_down(Key::Right) {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }
}

impl InputSource for RawInput {
    fn sample(&mut self) -> InputSnapshot {
        if self.released {
            return InputSnapshot::default();
        }
        let escape = self.is_down(Key::Escape);
        let pause = escape && !self.escape_was_down;
        self.escape_was_down = escape;

        InputSnapshot {
            move_intent: self.move_intent(),
            aim: self.pointer,
            block: self.is_down(Key::Space) || self.secondary,
            swing: self.primary || self.is_down(Key::E),
            pause,
            autopilot: self.autopilot,
        }
    }

    fn release(&mut self) {
        *self = Self {
            viewport: self.viewport,
            released: true,
            ..Default::default()
        };
    }
}

/// Replays a fixed sequence of snapshots, then repeats a fallback
///
/// Used by the headless runner and tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputSnapshot>,
    fallback: InputSnapshot,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>, fallback: InputSnapshot) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            fallback,
        }
    }

    /// Autopilot forever
    pub fn autopilot() -> Self {
        Self::new(
            [],
            InputSnapshot {
                autopilot: true,
                ..Default::default()
            },
        )
    }

    pub fn push(&mut self, snapshot: InputSnapshot) {
        self.frames.push_back(snapshot);
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self) -> InputSnapshot {
        self.frames
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn release(&mut self) {
        self.frames.clear();
        self.fallback = InputSnapshot::default();
    }
}
