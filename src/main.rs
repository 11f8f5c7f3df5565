//! Sword Arena headless runner
//!
//! Plays rounds with the autopilot driving the human and logs each outcome.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use sword_arena::consts::SIM_DT;
use sword_arena::input::ScriptedInput;
use sword_arena::sim::GamePhase;
use sword_arena::{Difficulty, Engine, ItemCatalog, Settings};

/// Give up on a round after this much simulated time (seconds)
const ROUND_TIME_LIMIT: f32 = 600.0;

#[derive(Parser, Debug)]
#[command(name = "sword-arena")]
#[command(about = "Play headless Sword Arena rounds with the autopilot")]
struct Cli {
    /// Seed for the first round; later rounds derive theirs from it
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Opponent difficulty (overrides the settings file)
    #[arg(long, value_enum, ignore_case = true)]
    difficulty: Option<Difficulty>,

    /// Number of rounds to play
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Opponents per round
    #[arg(long)]
    opponents: Option<usize>,

    /// Settings JSON to load
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the final render snapshot as JSON
    #[arg(long)]
    snapshot: bool,
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let mut settings = args
        .settings
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();
    if let Some(difficulty) = args.difficulty {
        settings.difficulty = difficulty;
    }

    log::info!(
        "Sword Arena (headless) starting: seed {}, {} round(s), difficulty {}",
        args.seed,
        args.rounds,
        settings.difficulty.as_str()
    );

    let mut engine = Engine::new(
        settings,
        ItemCatalog::builtin(),
        ScriptedInput::autopilot(),
        args.seed,
    );
    if let Some(count) = args.opponents {
        engine = engine.with_opponents(count);
    }

    let wins = Rc::new(Cell::new(0u32));
    let coins = Rc::new(Cell::new(0u32));
    {
        let (wins, coins) = (Rc::clone(&wins), Rc::clone(&coins));
        engine.on_round_end(move |outcome| {
            if outcome.human_survived {
                wins.set(wins.get() + 1);
            }
            coins.set(coins.get() + outcome.coins_earned);
        });
    }

    let frames_per_round = (ROUND_TIME_LIMIT / SIM_DT) as u32;
    for round in 0..args.rounds {
        if round == 0 {
            engine.start();
        } else {
            engine.reset();
        }

        let mut outcome = None;
        for _ in 0..frames_per_round {
            outcome = engine.advance(SIM_DT);
            if outcome.is_some() {
                break;
            }
        }

        let state = engine.state();
        match outcome {
            Some(outcome) => println!(
                "round {}: {} after {:.1}s ({} coins)",
                round + 1,
                if outcome.human_survived { "won" } else { "lost" },
                state.now(),
                outcome.coins_earned
            ),
            None => {
                log::warn!(
                    "Round {} hit the time limit in phase {:?} with {} standing",
                    round + 1,
                    state.phase,
                    state.remaining_alive
                );
                println!("round {}: unfinished", round + 1);
            }
        }
        debug_assert!(outcome.is_none() || state.phase == GamePhase::RoundEnd);
    }

    if args.snapshot {
        match serde_json::to_string_pretty(&engine.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Snapshot serialization failed: {e}"),
        }
    }

    println!(
        "won {}/{} rounds, {} coins",
        wins.get(),
        args.rounds,
        coins.get()
    );
    engine.destroy();
}
