use anyhow::{Context, Result};
use clap::Parser;
use minesweeper_agent::{Action, Agent, DeducedState, GameState, Oracle, World};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

mod config;

use config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Tally of every game played.
#[derive(Debug, Default)]
struct Summary {
    won: u64,
    lost: u64,
    abandoned: u64,
    turns: usize,
    unsound_flags: usize,
}

impl Summary {
    fn record(&mut self, state: GameState) {
        match state {
            GameState::Won => self.won += 1,
            GameState::Lost => self.lost += 1,
            GameState::Abandoned | GameState::Playing => self.abandoned += 1,
        }
    }
}

/// Plays one game and returns how it ended.
fn play_game(config: &Config, seed: u64, summary: &mut Summary) -> Result<GameState> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = config.start();
    let mut world = World::new(config.width, config.height, config.mines, start, &mut rng)?;
    let mut agent = Agent::new(config.width, config.height, config.mines, start)?;

    let mut unsound = 0;
    let state = world.play(&mut agent, |agent, action| {
        if !config.audit {
            return Ok(());
        }
        if let Action::Flag(at) = action {
            let mut oracle = Oracle::new(agent.board(), config.mines)
                .with_context(|| format!("audit of game {seed}"))?;
            let verdict = oracle.classify(at)?;
            if verdict != DeducedState::ForcedMine {
                warn!(seed, %at, ?verdict, "unsound flag");
                unsound += 1;
            }
        }
        Ok(())
    })?;

    summary.turns += agent.turns();
    summary.unsound_flags += unsound;

    info!(
        seed,
        ?state,
        turns = agent.turns(),
        revealed = agent.board().revealed_safe(),
        "game finished"
    );
    if config.show_board {
        println!("Game {seed} ({state:?}):\n{}", agent.board());
    }

    Ok(state)
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(
        width = config.width,
        height = config.height,
        mines = config.mines,
        games = config.games,
        audit = config.audit,
        "Starting minesweeper bot"
    );

    let mut summary = Summary::default();
    for seed in config.seed..config.seed + config.games {
        let state = play_game(&config, seed, &mut summary)?;
        summary.record(state);
    }

    println!("--- Summary ---");
    println!(
        "{} games on {}x{} with {} mines",
        config.games, config.width, config.height, config.mines
    );
    println!(
        "Won: {}  Lost: {}  Abandoned: {}",
        summary.won, summary.lost, summary.abandoned
    );
    println!(
        "Average turns: {:.1}",
        summary.turns as f64 / config.games as f64
    );
    if config.audit {
        println!("Unsound flags: {}", summary.unsound_flags);
    }

    Ok(())
}
