use anyhow::Result;
use clap::{Parser, ValueEnum};
use snake_dqn::config::RunConfig;
use snake_dqn::modes::{TrainConfig, TrainMode, WatchMode};
use snake_dqn::rl::{FeatureLayout, InferenceBackend, TrainingBackend, default_device};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snake_dqn")]
#[command(version, about = "Online deep Q-learning on a snake grid")]
struct Cli {
    /// What to run
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// Model path (weights in .mpk, metadata in .meta.json)
    #[arg(long, default_value = "models/snake_dqn.mpk")]
    model: PathBuf,

    /// JSON file with `game` and `dqn` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length
    #[arg(long)]
    grid_size: Option<usize>,

    /// Seed for apple placement and exploration
    #[arg(long)]
    seed: Option<u64>,

    /// Stop training after this many episodes (default: run until Ctrl-C)
    #[arg(long)]
    episodes: Option<usize>,

    /// Delay after each tick of an evaluation episode, in milliseconds
    #[arg(long, default_value = "200")]
    pace_ms: u64,

    /// Log a progress summary every N episodes
    #[arg(long, default_value = "100")]
    log_every: usize,

    /// Replayed transitions per tick (0 disables replay)
    #[arg(long)]
    replay_batch: Option<usize>,

    /// Use the 6-wide feature vector without motion features
    #[arg(long)]
    compact_features: bool,

    /// Ignore any saved model and start from a fresh network
    #[arg(long)]
    fresh: bool,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train the Q-network online
    Train,
    /// Watch a saved model play in the terminal
    Watch,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut run_config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(grid_size) = cli.grid_size {
        run_config.game.grid_size = grid_size;
    }
    if let Some(batch) = cli.replay_batch {
        run_config.dqn.replay_batch_size = batch;
    }
    if cli.compact_features {
        run_config.dqn.feature_layout = FeatureLayout::Compact;
    }

    match cli.mode {
        Mode::Train => {
            init_tracing();

            let mut train_config = TrainConfig::new(cli.model);
            train_config.max_episodes = cli.episodes;
            train_config.pace = Duration::from_millis(cli.pace_ms);
            train_config.log_frequency = cli.log_every;
            train_config.warm_start = !cli.fresh;
            train_config.seed = cli.seed;
            train_config.game_config = run_config.game;
            train_config.dqn_config = run_config.dqn;

            let mut train_mode =
                TrainMode::<TrainingBackend>::new(train_config, default_device())?;
            train_mode.run().await?;
        }
        Mode::Watch => {
            // No subscriber: log lines would tear the TUI
            let mut watch_mode = WatchMode::<InferenceBackend>::new(
                &cli.model,
                run_config.game,
                cli.seed,
                default_device(),
            )?;
            watch_mode.run().await?;
        }
    }

    Ok(())
}
