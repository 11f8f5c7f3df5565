//! Round lifecycle and fixed-timestep driver
//!
//! `Engine` owns the round state and its input source. The host calls
//! `advance(frame_dt)` once per display frame; the engine turns wall time into
//! whole simulation ticks and reports the round outcome once, a short delay
//! after the final hit.

use crate::catalog::ItemCatalog;
use crate::consts::*;
use crate::input::InputSource;
use crate::settings::Settings;
use crate::sim::state::{GamePhase, GameState, RoundConfig, Snapshot};
use crate::sim::tick;

/// What the host learns when a round is over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub human_survived: bool,
    /// Reward for the caller to credit (the engine never touches persistence)
    pub coins_earned: u32,
}

impl RoundOutcome {
    pub fn new(human_survived: bool) -> Self {
        Self {
            human_survived,
            coins_earned: if human_survived { ROUND_WIN_REWARD } else { 0 },
        }
    }
}

/// Round-end notification
pub type RoundEndCallback = Box<dyn FnMut(RoundOutcome)>;

/// Runs rounds: lifecycle controls, tick pacing and the round-end timer
pub struct Engine {
    state: GameState,
    settings: Settings,
    catalog: ItemCatalog,
    input: Box<dyn InputSource>,
    opponent_count: usize,
    /// Seed of round zero; later rounds derive theirs from it
    base_seed: u64,
    round: u64,
    /// Leftover wall time not yet consumed by ticks
    accumulator: f32,
    /// Seconds until the outcome is reported, once the round has ended
    round_end_timer: Option<f32>,
    outcome_reported: bool,
    /// Paused by the host; only `resume` or `reset` clears it
    host_paused: bool,
    on_round_end: Option<RoundEndCallback>,
    destroyed: bool,
}

impl Engine {
    pub fn new(
        settings: Settings,
        catalog: ItemCatalog,
        input: impl InputSource + 'static,
        seed: u64,
    ) -> Self {
        let config = RoundConfig::from_settings(&settings, &catalog);
        let opponent_count = config.opponent_count;
        Self {
            state: GameState::new(config, seed),
            settings,
            catalog,
            input: Box::new(input),
            opponent_count,
            base_seed: seed,
            round: 0,
            accumulator: 0.0,
            round_end_timer: None,
            outcome_reported: false,
            host_paused: false,
            on_round_end: None,
            destroyed: false,
        }
    }

    /// Rounds built after this use `count` opponents (takes effect on reset)
    pub fn with_opponents(mut self, count: usize) -> Self {
        self.opponent_count = count;
        self.state = GameState::new(self.round_config(), self.state.seed);
        self
    }

    /// Register the round-end notification (replaces any previous one)
    pub fn on_round_end(&mut self, callback: impl FnMut(RoundOutcome) + 'static) {
        self.on_round_end = Some(Box::new(callback));
    }

    /// Settings are read at reset; changing them never alters a live round
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Owned render data for the latest tick
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Begin ticking a freshly built round
    pub fn start(&mut self) {
        if self.destroyed || self.state.phase != GamePhase::Ready {
            return;
        }
        self.state.phase = GamePhase::Playing;
        self.accumulator = 0.0;
        log::info!(
            "Round {} started (seed {}, {} combatants, difficulty {:.2})",
            self.round,
            self.state.seed,
            self.state.combatants.len(),
            self.state.config.difficulty
        );
    }

    /// Stop ticking until `resume`; state is kept as is
    ///
    /// The player's pause key cannot undo this, unlike a pause that came in
    /// through input.
    pub fn pause(&mut self) {
        if self.destroyed {
            return;
        }
        match self.state.phase {
            GamePhase::Playing => {
                self.state.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", self.state.time_ticks);
            }
            GamePhase::Paused => {}
            _ => return,
        }
        self.host_paused = true;
        self.accumulator = 0.0;
    }

    /// Continue from either kind of pause
    pub fn resume(&mut self) {
        if !self.destroyed && self.state.phase == GamePhase::Paused {
            self.state.phase = GamePhase::Playing;
            self.host_paused = false;
            self.accumulator = 0.0;
            log::info!("Resumed at tick {}", self.state.time_ticks);
        }
    }

    pub fn is_host_paused(&self) -> bool {
        self.host_paused
    }

    /// Rebuild every entity and the ball from the current settings and start
    /// playing. A pending round-end report from the previous round is dropped.
    pub fn reset(&mut self) {
        if self.destroyed {
            return;
        }
        self.round += 1;
        let seed = self.round_seed();
        self.state = GameState::new(self.round_config(), seed);
        self.state.phase = GamePhase::Playing;
        self.accumulator = 0.0;
        self.round_end_timer = None;
        self.outcome_reported = false;
        self.host_paused = false;
        log::info!(
            "Round {} reset (seed {seed}, sword {}, difficulty {})",
            self.round,
            self.state.config.sword.id,
            self.settings.difficulty.as_str()
        );
    }

    /// Stop for good and release the input source
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.round_end_timer = None;
        self.on_round_end = None;
        self.input.release();
        log::info!("Engine destroyed after round {}", self.round);
    }

    /// Consume one display frame's worth of wall time
    ///
    /// Runs as many fixed ticks as fit (at most `MAX_SUBSTEPS`), sampling the
    /// input source once per tick. Returns the outcome on the frame the
    /// round-end delay runs out; the registered callback fires at the same
    /// moment.
    pub fn advance(&mut self, frame_dt: f32) -> Option<RoundOutcome> {
        if self.destroyed {
            return None;
        }
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };

        if self.host_paused {
            // Keep edge detection current so a key held over the pause
            // doesn't fire on resume
            self.input.sample();
            return None;
        }

        match self.state.phase {
            GamePhase::Playing | GamePhase::Paused => self.run_ticks(frame_dt),
            GamePhase::RoundEnd => return self.count_down(frame_dt),
            GamePhase::Ready => {}
        }

        if self.state.phase == GamePhase::RoundEnd && !self.outcome_reported {
            self.round_end_timer.get_or_insert(ROUND_END_DELAY);
        }
        None
    }

    fn run_ticks(&mut self, frame_dt: f32) {
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.sample();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            if self.state.phase == GamePhase::RoundEnd {
                self.accumulator = 0.0;
                break;
            }
        }
    }

    fn count_down(&mut self, frame_dt: f32) -> Option<RoundOutcome> {
        let remaining = self.round_end_timer.as_mut()?;
        *remaining -= frame_dt;
        if *remaining > 0.0 {
            return None;
        }

        self.round_end_timer = None;
        self.outcome_reported = true;
        let outcome = RoundOutcome::new(self.state.human_survived.unwrap_or(false));
        log::info!(
            "Round {} outcome: survived={} coins={}",
            self.round,
            outcome.human_survived,
            outcome.coins_earned
        );
        if let Some(callback) = self.on_round_end.as_mut() {
            callback(outcome);
        }
        Some(outcome)
    }

    fn round_config(&self) -> RoundConfig {
        RoundConfig::from_settings(&self.settings, &self.catalog).with_opponents(self.opponent_count)
    }

    /// Distinct, reproducible seed per round
    fn round_seed(&self) -> u64 {
        self.base_seed
            .wrapping_add(self.round.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputSnapshot, ScriptedInput};
    use crate::settings::Difficulty;
    use crate::sim::state::Ball;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(input: ScriptedInput) -> Engine {
        Engine::new(Settings::default(), ItemCatalog::builtin(), input, 42)
    }

    /// Place the ball so the next tick kills the human
    fn doom_human(engine: &mut Engine) {
        let human = &mut engine.state.combatants[0];
        human.health = 5.0;
        let pos = human.pos;
        engine.state.ball = Ball::new(pos + Vec2::new(0.0, 25.0), Vec2::new(0.0, -5.0));
    }

    #[test]
    fn test_start_pause_resume() {
        let mut engine = engine(ScriptedInput::new([], InputSnapshot::default()));
        assert_eq!(engine.phase(), GamePhase::Ready);

        // Ready never ticks
        engine.advance(0.05);
        assert_eq!(engine.state().time_ticks, 0);

        engine.start();
        engine.advance(SIM_DT * 3.5);
        assert_eq!(engine.state().time_ticks, 3);

        engine.pause();
        assert_eq!(engine.phase(), GamePhase::Paused);
        engine.advance(0.1);
        assert_eq!(engine.state().time_ticks, 3);

        engine.resume();
        engine.advance(SIM_DT * 2.0 + 1e-4);
        assert_eq!(engine.state().time_ticks, 5);
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let mut engine = engine(ScriptedInput::new([], InputSnapshot::default()));
        engine.start();
        engine.advance(5.0);
        assert!(engine.state().time_ticks <= MAX_SUBSTEPS as u64);
        engine.advance(f32::NAN);
        engine.advance(-1.0);
        assert!(engine.state().time_ticks <= MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_escape_toggles_pause_through_input() {
        let pause = InputSnapshot {
            pause: true,
            ..Default::default()
        };
        let mut engine = engine(ScriptedInput::new(
            [InputSnapshot::default(), pause.clone(), InputSnapshot::default(), pause],
            InputSnapshot::default(),
        ));
        engine.start();
        engine.advance(SIM_DT * 3.0 + 1e-4);
        assert_eq!(engine.phase(), GamePhase::Paused);
        assert_eq!(engine.state().time_ticks, 1);

        engine.advance(SIM_DT + 1e-4);
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.state().time_ticks, 2);
    }

    #[test]
    fn test_pause_key_cannot_undo_host_pause() {
        let pause = InputSnapshot {
            pause: true,
            ..Default::default()
        };
        let mut engine = engine(ScriptedInput::new([], pause));
        engine.start();
        engine.pause();
        assert!(engine.is_host_paused());

        for _ in 0..10 {
            engine.advance(SIM_DT * 2.0);
        }
        assert_eq!(engine.phase(), GamePhase::Paused);
        assert_eq!(engine.state().time_ticks, 0);

        engine.resume();
        assert!(!engine.is_host_paused());
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_host_pause_sticks_over_key_pause() {
        let pause = InputSnapshot {
            pause: true,
            ..Default::default()
        };
        let mut engine = engine(ScriptedInput::new(
            [pause.clone(), pause],
            InputSnapshot::default(),
        ));
        engine.start();
        engine.advance(SIM_DT + 1e-4);
        assert_eq!(engine.phase(), GamePhase::Paused);

        // Host pauses on top of the key pause; the next key press is drained
        engine.pause();
        engine.advance(SIM_DT + 1e-4);
        assert_eq!(engine.phase(), GamePhase::Paused);
        assert!(engine.is_host_paused());

        engine.resume();
        engine.advance(SIM_DT + 1e-4);
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.state().time_ticks, 1);
    }

    #[test]
    fn test_outcome_reported_once_after_delay() {
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let mut engine = engine(ScriptedInput::new([], InputSnapshot::default())).with_opponents(1);
        let sink = Rc::clone(&outcomes);
        engine.on_round_end(move |outcome| sink.borrow_mut().push(outcome));

        engine.start();
        doom_human(&mut engine);
        assert_eq!(engine.advance(SIM_DT + 1e-4), None);
        assert_eq!(engine.phase(), GamePhase::RoundEnd);
        assert!(outcomes.borrow().is_empty());

        // Not before the delay has elapsed
        let mut elapsed = 0.0;
        let mut reported = None;
        while elapsed < ROUND_END_DELAY + 0.5 {
            if let Some(outcome) = engine.advance(0.05) {
                assert!(reported.is_none());
                reported = Some((outcome, elapsed));
            }
            elapsed += 0.05;
        }
        let (outcome, at) = reported.expect("outcome after the delay");
        assert!(at >= ROUND_END_DELAY - 0.06);
        assert_eq!(outcome, RoundOutcome::new(false));
        assert_eq!(outcome.coins_earned, 0);
        assert_eq!(*outcomes.borrow(), vec![outcome]);
    }

    #[test]
    fn test_reset_cancels_pending_outcome() {
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let mut engine = engine(ScriptedInput::new([], InputSnapshot::default())).with_opponents(1);
        let sink = Rc::clone(&outcomes);
        engine.on_round_end(move |outcome| sink.borrow_mut().push(outcome));

        engine.start();
        doom_human(&mut engine);
        engine.advance(SIM_DT + 1e-4);
        assert_eq!(engine.phase(), GamePhase::RoundEnd);

        engine.reset();
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.round(), 1);
        assert!(engine.state().combatants.iter().all(|c| c.alive));

        // Park the ball in a corner so the new round can't end on its own
        engine.state.ball = Ball::new(Vec2::new(40.0, 40.0), Vec2::ZERO);
        for _ in 0..60 {
            engine.advance(0.05);
        }
        assert!(outcomes.borrow().is_empty());
    }

    #[test]
    fn test_reset_uses_current_settings() {
        let mut engine = engine(ScriptedInput::new([], InputSnapshot::default()));
        engine.start();
        engine.set_settings(Settings {
            difficulty: Difficulty::Hard,
            equipped_sword: "dragon_fang".into(),
            ..Default::default()
        });
        // Live round untouched
        assert_eq!(engine.state().config.sword.id, "wooden_sword");

        engine.reset();
        assert_eq!(engine.state().config.sword.id, "dragon_fang");
        assert_eq!(engine.state().combatants[0].sword.length, 100.0);
        assert_eq!(engine.state().config.difficulty, Difficulty::Hard.scalar());
        assert_ne!(engine.state().seed, 42);
    }

    #[test]
    fn test_destroy_stops_everything() {
        let mut engine = engine(ScriptedInput::autopilot());
        engine.start();
        engine.advance(0.05);
        let ticks = engine.state().time_ticks;

        engine.destroy();
        assert!(engine.is_destroyed());
        assert_eq!(engine.advance(0.1), None);
        engine.reset();
        engine.resume();
        engine.advance(0.1);
        assert_eq!(engine.state().time_ticks, ticks);
        assert_eq!(engine.round(), 0);
    }

    #[test]
    fn test_winner_earns_reward() {
        let mut engine = engine(ScriptedInput::new([], InputSnapshot::default())).with_opponents(0);
        engine.start();
        engine.advance(SIM_DT + 1e-4);
        assert_eq!(engine.phase(), GamePhase::RoundEnd);

        let mut outcome = None;
        for _ in 0..30 {
            outcome = outcome.or(engine.advance(0.05));
        }
        assert_eq!(
            outcome,
            Some(RoundOutcome {
                human_survived: true,
                coins_earned: ROUND_WIN_REWARD
            })
        );
    }
}
