use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_empire::{Engine, EngineConfig, GameResult, PlayerId, RaiderCommander};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless Empire self-play runner")]
struct Cli {
    /// Path to an engine config YAML file (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of players
    #[arg(long)]
    players: Option<usize>,

    /// Player-turns to play before stopping
    #[arg(long, default_value_t = 200)]
    turns: u32,

    /// Print player 1's initial map and exit
    #[arg(long)]
    smoke: bool,

    /// Write a snapshot of the final state here
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log filter, e.g. "info" or "rust_empire=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).context("invalid --log-level filter")?)
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(players) = cli.players {
        config = config.with_players(players);
    }

    let mut engine = Engine::new(config).context("building world")?;

    if cli.smoke {
        for row in engine.view(PlayerId::new(0)).glyph_rows() {
            println!("{row}");
        }
        return Ok(());
    }

    let mut raider = RaiderCommander;
    let mut played = 0;
    while played < cli.turns && !engine.is_over() {
        engine.play_commander_turn(&mut raider);
        played += 1;
    }
    info!(played, turn = engine.turn_number(), "self-play finished");

    for player in PlayerId::all(engine.player_count()) {
        let summary = engine.player_summary(player);
        println!(
            "{player}: {} cities, {} units{}",
            summary.cities,
            summary.units,
            if summary.eliminated { " (eliminated)" } else { "" }
        );
    }
    match engine.result() {
        Some(GameResult::Winner(player)) => println!("{player} wins on turn {}", engine.turn_number()),
        Some(GameResult::Draw) => println!("Draw on turn {}", engine.turn_number()),
        None => println!("No result after {played} player-turns (turn {})", engine.turn_number()),
    }

    if let Some(path) = &cli.save {
        engine
            .save_to_path(path)
            .with_context(|| format!("saving snapshot to {}", path.display()))?;
        println!("Saved snapshot to {}", path.display());
    }
    Ok(())
}
