//! Watch mode for a trained Q-network
//!
//! Loads a saved model and lets it play greedily in a ratatui view. A fatal
//! move starts a new episode.
//!
//! # Controls
//!
//! - Space: Pause/unpause
//! - R: Reset episode
//! - 1-4: Speed control (1=slow, 2=normal, 3=fast, 4=very fast)
//! - Q/Esc: Quit

use anyhow::{Context, Result, anyhow, ensure};
use burn::tensor::{Tensor, TensorData, backend::Backend};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{Stderr, stderr},
    path::Path,
    time::Duration,
};
use tokio::time::{Interval, interval};

use crate::game::{Direction, GameConfig, GridWorld, NUM_ACTIONS};
use crate::render::{Renderer, WatchStatus};
use crate::rl::{FeatureVector, ModelMetadata, QNetwork, QValues, StateEncoder, argmax, load_model};

/// Playback speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSpeed {
    /// 2 Hz
    Slow,
    /// 5 Hz, the pace of evaluation episodes during training
    Normal,
    /// 20 Hz
    Fast,
    /// 60 Hz
    VeryFast,
}

impl PlaybackSpeed {
    fn tick_interval(&self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(500),
            Self::Normal => Duration::from_millis(200),
            Self::Fast => Duration::from_millis(50),
            Self::VeryFast => Duration::from_millis(16),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }
}

/// Greedy Q-values of one feature vector
fn predict<B: Backend>(
    network: &QNetwork<B>,
    features: &FeatureVector,
    device: &B::Device,
) -> Result<QValues> {
    let input = Tensor::<B, 2>::from_data(
        TensorData::new(features.as_slice().to_vec(), [1, features.len()]),
        device,
    );
    let values: Vec<f32> = network
        .forward(input)
        .into_data()
        .to_vec()
        .map_err(|e| anyhow!("failed to read Q-values: {:?}", e))?;

    values.try_into().map_err(|v: Vec<f32>| {
        anyhow!("Q-network returned {} values, expected {}", v.len(), NUM_ACTIONS)
    })
}

/// Watch mode for a trained agent
pub struct WatchMode<B: Backend> {
    network: QNetwork<B>,

    device: B::Device,

    world: GridWorld,

    encoder: StateEncoder,

    renderer: Renderer,

    metadata: ModelMetadata,

    should_quit: bool,

    paused: bool,

    speed: PlaybackSpeed,

    /// 1-based index of the running episode
    episode: usize,

    best_apples: u32,

    last_q_values: Option<QValues>,
}

impl<B: Backend> WatchMode<B> {
    /// Load the model saved at `model_path`
    pub fn new(
        model_path: &Path,
        game_config: GameConfig,
        seed: Option<u64>,
        device: B::Device,
    ) -> Result<Self> {
        game_config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid game configuration")?;

        let (network, metadata) = load_model::<B>(model_path, &device)
            .with_context(|| format!("Failed to load model from {:?}", model_path))?
            .ok_or_else(|| anyhow!("No model saved at {:?}", model_path))?;

        let layout = metadata.dqn_config.feature_layout;
        ensure!(
            layout.width() == metadata.network_config.input_dim,
            "model metadata is inconsistent: {:?} layout but {} inputs",
            layout,
            metadata.network_config.input_dim
        );

        Ok(Self {
            network,
            device,
            world: GridWorld::new(game_config, seed),
            encoder: StateEncoder::new(layout),
            renderer: Renderer::new(),
            metadata,
            should_quit: false,
            paused: false,
            speed: PlaybackSpeed::Normal,
            episode: 1,
            best_apples: 0,
            last_q_values: None,
        })
    }

    /// Set up the terminal, play until the user quits, then restore it
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_loop(&mut terminal).await;

        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stderr>>) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick_timer = interval(self.speed.tick_interval());
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer);
                    }
                }

                _ = tick_timer.tick() => {
                    if !self.paused {
                        self.step()?;
                    }
                }

                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.world, &self.status());
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Play one greedy move, starting a new episode on a fatal reward
    pub fn step(&mut self) -> Result<Direction> {
        let features = self.encoder.encode_for_action(&self.world);
        let q_values = predict(&self.network, &features, &self.device)?;
        let action = Direction::ALL[argmax(&q_values)];
        self.last_q_values = Some(q_values);

        let result = self.world.apply(action);
        if result.terminated {
            self.best_apples = self.best_apples.max(self.world.apples());
            self.reset_episode();
        }

        Ok(action)
    }

    fn reset_episode(&mut self) {
        self.world.reset();
        self.encoder.reset();
        self.episode += 1;
    }

    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('r') => self.reset_episode(),
            KeyCode::Char('1') => self.change_speed(PlaybackSpeed::Slow, tick_timer),
            KeyCode::Char('2') => self.change_speed(PlaybackSpeed::Normal, tick_timer),
            KeyCode::Char('3') => self.change_speed(PlaybackSpeed::Fast, tick_timer),
            KeyCode::Char('4') => self.change_speed(PlaybackSpeed::VeryFast, tick_timer),
            _ => {}
        }
    }

    fn change_speed(&mut self, new_speed: PlaybackSpeed, tick_timer: &mut Interval) {
        self.speed = new_speed;
        *tick_timer = interval(self.speed.tick_interval());
    }

    fn status(&self) -> WatchStatus {
        WatchStatus {
            episode: self.episode,
            best_apples: self.best_apples,
            episodes_trained: self.metadata.episodes_trained,
            speed: self.speed.as_str(),
            paused: self.paused,
            last_q_values: self.last_q_values,
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
