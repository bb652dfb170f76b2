//! Training mode for the online DQN agent
//!
//! Runs the tick loop of [`Trainer`] forever (or for a fixed number of
//! episodes), logs progress through `tracing`, saves the model when a greedy
//! evaluation episode starts and when it ends, and once more on exit. Ticks of
//! evaluation episodes are paced so they can be followed in the log.
//!
//! # Example
//!
//! ```rust,ignore
//! use snake_dqn::modes::{TrainConfig, TrainMode};
//! use snake_dqn::rl::{TrainingBackend, default_device};
//! use std::path::PathBuf;
//!
//! let config = TrainConfig::new(PathBuf::from("models/snake_dqn.mpk"));
//! let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device())?;
//! train_mode.run().await?;
//! ```

use anyhow::{Context, Result, ensure};
use burn::tensor::backend::AutodiffBackend;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::game::GameConfig;
use crate::metrics::{LogTelemetry, TrainingStats};
use crate::rl::{
    BurnQFunction, DqnConfig, ModelMetadata, QNetworkConfig, Trainer, load_model, save_model,
};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Where the model is loaded from and saved to
    pub model_path: PathBuf,

    /// Stop after this many episodes of this run; `None` runs until Ctrl-C
    pub max_episodes: Option<usize>,

    /// Log a progress summary every N finished episodes
    pub log_frequency: usize,

    /// Delay after each tick of an evaluation episode
    pub pace: Duration,

    /// Continue from a saved model when one exists
    pub warm_start: bool,

    /// Seed for apple placement and exploration
    pub seed: Option<u64>,

    pub game_config: GameConfig,

    pub dqn_config: DqnConfig,
}

impl TrainConfig {
    /// Create a training configuration with defaults
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::modes::TrainConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = TrainConfig::new(PathBuf::from("models/snake_dqn.mpk"));
    /// assert_eq!(config.max_episodes, None);
    /// ```
    pub fn new(model_path: PathBuf) -> Self {
        Self {
            model_path,
            max_episodes: None,
            log_frequency: 100,
            pace: Duration::from_millis(200),
            warm_start: true,
            seed: None,
            game_config: GameConfig::default(),
            dqn_config: DqnConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.game_config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid game configuration")?;
        self.dqn_config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid DQN configuration")?;
        ensure!(self.log_frequency > 0, "log_frequency must be positive");
        Ok(())
    }
}

/// Why a training run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EpisodeLimit,
    Interrupted,
}

/// Training mode for the DQN agent
pub struct TrainMode<B: AutodiffBackend> {
    trainer: Trainer<BurnQFunction<B>>,

    stats: TrainingStats,

    config: TrainConfig,

    /// Episodes finished before this run started
    resumed_from: usize,

    /// Checkpoints written by this run
    checkpoints: usize,

    /// Fit count of the last checkpoint
    saved_at_fit: Option<usize>,
}

impl<B: AutodiffBackend> TrainMode<B> {
    /// Create a training mode, warm-starting from `model_path` if a model is there
    pub fn new(config: TrainConfig, device: B::Device) -> Result<Self> {
        config.validate()?;

        let input_dim = config.dqn_config.feature_layout.width();
        let saved = if config.warm_start {
            load_model::<B>(&config.model_path, &device)?
        } else {
            None
        };

        let (q_function, resumed_from, best_apples) = match saved {
            Some((network, metadata)) => {
                ensure!(
                    metadata.network_config.input_dim == input_dim,
                    "saved model at {:?} takes {} features, the {:?} layout produces {}",
                    config.model_path,
                    metadata.network_config.input_dim,
                    config.dqn_config.feature_layout,
                    input_dim
                );
                info!(
                    path = ?config.model_path,
                    episodes = metadata.episodes_trained,
                    best_apples = metadata.best_apples,
                    "resuming from saved model"
                );
                let q_function = BurnQFunction::from_network(
                    network,
                    metadata.network_config.clone(),
                    config.dqn_config.learning_rate,
                    device,
                );
                (q_function, metadata.episodes_trained, metadata.best_apples)
            }
            None => {
                let network_config =
                    QNetworkConfig::new(input_dim).with_hidden_dim(config.dqn_config.hidden_dim);
                let q_function =
                    BurnQFunction::new(network_config, config.dqn_config.learning_rate, device);
                (q_function, 0, 0)
            }
        };

        let mut trainer = Trainer::new(
            q_function,
            config.game_config.clone(),
            config.dqn_config.clone(),
            config.seed,
        )?;
        trainer.resume(resumed_from, best_apples);

        Ok(Self {
            trainer,
            stats: TrainingStats::new(100),
            config,
            resumed_from,
            checkpoints: 0,
            saved_at_fit: None,
        })
    }

    /// Train until the episode limit or Ctrl-C, then save the model
    pub async fn run(&mut self) -> Result<StopReason> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let signal_task = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = shutdown_tx.send(true);
                }
                Err(err) => {
                    warn!(error = %err, "cannot listen for Ctrl-C");
                    // Dropping the sender would cut every paced sleep short
                    std::future::pending::<()>().await;
                }
            }
        });

        let result = self.run_until(shutdown_rx).await;
        signal_task.abort();
        result
    }

    /// Train until the episode limit or until `shutdown` turns true
    pub async fn run_until(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<StopReason> {
        self.log_header();
        let mut telemetry = LogTelemetry;

        let reason = loop {
            if *shutdown.borrow() {
                break StopReason::Interrupted;
            }
            if self.episode_limit_reached() {
                break StopReason::EpisodeLimit;
            }

            if self.trainer.episode_ticks() == 0 && self.trainer.is_evaluation_episode() {
                self.save_checkpoint()?;
            }

            let outcome = self.trainer.step(&mut telemetry)?;

            if let Some(summary) = &outcome.finished {
                self.stats.record_summary(summary);

                if summary.evaluation {
                    info!(
                        episode = summary.episode,
                        apples = summary.apples,
                        ticks = summary.ticks,
                        reward = summary.total_reward,
                        truncated = summary.truncated,
                        "evaluation episode finished"
                    );
                    self.save_checkpoint()?;
                }

                if self.stats.total_episodes() % self.config.log_frequency == 0 {
                    info!(episode = summary.episode, "{}", self.stats.format_summary());
                }
            }

            if outcome.snapshot.evaluation && !self.config.pace.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.pace) => {}
                    Ok(()) = shutdown.changed() => {}
                }
            } else {
                tokio::task::yield_now().await;
            }
        };

        if reason == StopReason::Interrupted {
            warn!("interrupted, saving model before exit");
        }
        self.save_checkpoint()?;

        info!(
            path = ?self.config.model_path,
            episodes = self.trainer.episodes_done(),
            best_apples = self.trainer.best_apples(),
            "training stopped"
        );
        info!("{}", self.stats.format_summary());

        Ok(reason)
    }

    fn episode_limit_reached(&self) -> bool {
        self.config
            .max_episodes
            .is_some_and(|limit| self.episodes_this_run() >= limit)
    }

    /// Episodes finished by this run
    pub fn episodes_this_run(&self) -> usize {
        self.trainer.episodes_done() - self.resumed_from
    }

    /// Save the model and its metadata to the configured path
    ///
    /// Skipped when nothing was fitted since the last checkpoint.
    fn save_checkpoint(&mut self) -> Result<()> {
        let q_function = self.trainer.q_function();
        if self.saved_at_fit == Some(q_function.fits()) {
            return Ok(());
        }

        let metadata = ModelMetadata::new(
            q_function.network_config().clone(),
            self.config.dqn_config.clone(),
            self.trainer.episodes_done(),
            q_function.fits(),
            self.trainer.best_apples(),
        );

        save_model(q_function, &metadata, &self.config.model_path).with_context(|| {
            format!("Failed to save model to {:?}", self.config.model_path)
        })?;

        info!(
            path = ?self.config.model_path,
            episodes = metadata.episodes_trained,
            "checkpoint saved"
        );
        self.saved_at_fit = Some(q_function.fits());
        self.checkpoints += 1;

        Ok(())
    }

    fn log_header(&self) {
        let dqn = &self.config.dqn_config;
        info!(
            grid_size = self.config.game_config.grid_size,
            reverse_guard = self.config.game_config.reverse_guard,
            features = ?dqn.feature_layout,
            hidden_dim = dqn.hidden_dim,
            learning_rate = dqn.learning_rate,
            gamma = dqn.gamma,
            fit_epochs = dqn.fit_epochs,
            exploration_start = dqn.exploration_start,
            exploration_decay = dqn.exploration_decay,
            evaluation_interval = dqn.evaluation_interval,
            replay_batch_size = dqn.replay_batch_size,
            max_episode_ticks = dqn.max_episode_ticks,
            max_episodes = ?self.config.max_episodes,
            resumed_from = self.resumed_from,
            path = ?self.config.model_path,
            "starting DQN training"
        );
    }

    /// Checkpoints written so far, the exit save included
    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn trainer(&self) -> &Trainer<BurnQFunction<B>> {
        &self.trainer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{InferenceBackend, TrainingBackend, default_device, metadata_path};
    use tempfile::TempDir;

    /// Small, fully random and fast configuration
    fn test_config(model_path: PathBuf, max_episodes: usize) -> TrainConfig {
        let mut config = TrainConfig::new(model_path);
        config.max_episodes = Some(max_episodes);
        config.pace = Duration::ZERO;
        config.seed = Some(3);
        config.log_frequency = 1;
        config.dqn_config.hidden_dim = 16;
        config.dqn_config.fit_epochs = 1;
        config.dqn_config.exploration_start = 1.0;
        config.dqn_config.exploration_decay = 0.0;
        config.dqn_config.evaluation_interval = 1000;
        config
    }

    /// Every episode greedy and paced, cut off after a few ticks
    fn paced_config(model_path: PathBuf, max_episodes: usize, pace: Duration) -> TrainConfig {
        let mut config = test_config(model_path, max_episodes);
        config.pace = pace;
        config.dqn_config.evaluation_interval = 1;
        config.dqn_config.max_episode_ticks = 4;
        config
    }

    #[test]
    fn test_train_config_defaults() {
        let config = TrainConfig::new(PathBuf::from("model.mpk"));
        assert_eq!(config.pace, Duration::from_millis(200));
        assert!(config.warm_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = TrainConfig::new(PathBuf::from("model.mpk"));
        config.game_config.grid_size = 1;
        assert!(TrainMode::<TrainingBackend>::new(config, default_device()).is_err());
    }

    #[tokio::test]
    async fn test_run_stops_at_episode_limit_and_saves() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let config = test_config(model_path.clone(), 2);

        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        let (_tx, rx) = watch::channel(false);
        let reason = train_mode.run_until(rx).await.unwrap();

        assert_eq!(reason, StopReason::EpisodeLimit);
        assert_eq!(train_mode.stats().total_episodes(), 2);
        assert!(metadata_path(&model_path).exists());

        let (_, metadata) = load_model::<InferenceBackend>(&model_path, &default_device())
            .unwrap()
            .unwrap();
        assert_eq!(metadata.episodes_trained, 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_before_first_tick() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let config = test_config(model_path.clone(), 10);

        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let reason = train_mode.run_until(rx).await.unwrap();

        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(train_mode.episodes_this_run(), 0);
        // The model is still saved on the way out
        assert!(metadata_path(&model_path).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_episodes_are_checkpointed_and_paced() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let pace = Duration::from_millis(10);
        let config = paced_config(model_path.clone(), 2, pace);

        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        let (_tx, rx) = watch::channel(false);
        let start = tokio::time::Instant::now();
        let reason = train_mode.run_until(rx).await.unwrap();

        assert_eq!(reason, StopReason::EpisodeLimit);
        assert_eq!(train_mode.stats().evaluations().len(), 2);
        // Start of episode 1, end of episode 1, end of episode 2; the start of
        // episode 2 and the exit save have nothing new to write
        assert_eq!(train_mode.checkpoints(), 3);
        assert!(metadata_path(&model_path).exists());

        let ticks = train_mode.trainer().q_function().fits() as u32;
        assert!(start.elapsed() >= pace * ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_episode_checkpointed_when_it_starts() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let mut config = paced_config(model_path.clone(), 10, Duration::from_secs(3600));
        config.dqn_config.max_episode_ticks = 0;

        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        let (tx, rx) = watch::channel(false);
        let (result, _) = tokio::join!(train_mode.run_until(rx), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            // Only the start-of-episode checkpoint exists while the first tick is paced
            assert!(metadata_path(&model_path).exists());
            tx.send(true).unwrap();
        });

        assert_eq!(result.unwrap(), StopReason::Interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cuts_paced_sleep_short() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let pace = Duration::from_secs(3600);
        let config = paced_config(model_path, 10, pace);

        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        let (tx, rx) = watch::channel(false);
        let start = tokio::time::Instant::now();
        let (result, _) = tokio::join!(train_mode.run_until(rx), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            tx.send(true).unwrap();
        });

        assert_eq!(result.unwrap(), StopReason::Interrupted);
        assert!(start.elapsed() < pace);
        assert_eq!(train_mode.episodes_this_run(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_shutdown_channel_keeps_pacing() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let pace = Duration::from_millis(10);
        let config = paced_config(model_path, 1, pace);

        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let start = tokio::time::Instant::now();
        let reason = train_mode.run_until(rx).await.unwrap();

        assert_eq!(reason, StopReason::EpisodeLimit);
        let ticks = train_mode.trainer().q_function().fits() as u32;
        assert!(ticks >= 1);
        assert!(start.elapsed() >= pace * ticks);
    }

    #[tokio::test]
    async fn test_warm_start_resumes_episode_count() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");

        let mut first =
            TrainMode::<TrainingBackend>::new(test_config(model_path.clone(), 1), default_device())
                .unwrap();
        let (_tx, rx) = watch::channel(false);
        first.run_until(rx).await.unwrap();

        let second =
            TrainMode::<TrainingBackend>::new(test_config(model_path.clone(), 1), default_device())
                .unwrap();
        assert_eq!(second.trainer().episode(), 2);
        assert_eq!(second.episodes_this_run(), 0);
    }

    #[test]
    fn test_warm_start_rejects_other_layout() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("snake.mpk");
        let device = default_device();

        let q_function = BurnQFunction::<TrainingBackend>::new(
            QNetworkConfig::new(6).with_hidden_dim(8),
            1e-4,
            device,
        );
        let metadata = ModelMetadata::new(
            q_function.network_config().clone(),
            DqnConfig::default(),
            5,
            0,
            0,
        );
        save_model(&q_function, &metadata, &model_path).unwrap();

        // Default layout has motion features (9 wide)
        let config = test_config(model_path, 1);
        assert!(TrainMode::<TrainingBackend>::new(config, default_device()).is_err());
    }
}
