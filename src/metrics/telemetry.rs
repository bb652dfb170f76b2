//! Per-tick and per-episode telemetry
//!
//! Telemetry is purely observational: sinks see a snapshot and the grid, and
//! nothing they do feeds back into training.

use tracing::{debug, info};

use crate::game::{Direction, GridWorld, StepEvent};
use crate::render::board::render_board;

/// Everything observable about one training tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    /// 1-based episode index
    pub episode: usize,
    /// 1-based tick within the episode
    pub tick: u32,
    pub action: Direction,
    /// Action came from the random branch
    pub explored: bool,
    pub reward: i32,
    pub event: StepEvent,
    /// Sum of rewards this episode, this tick included
    pub cumulative_reward: i64,
    /// Exploration rate of the episode (unclamped)
    pub epsilon: f64,
    /// Apples eaten this episode
    pub apples: u32,
    /// Best apple count over finished episodes
    pub best_apples: u32,
    /// Loss of the last online fit epoch
    pub loss: Option<f32>,
    /// The reward ended the episode
    pub fatal: bool,
    /// Greedy evaluation episode
    pub evaluation: bool,
}

/// Totals of a finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub ticks: u32,
    pub total_reward: i64,
    pub apples: u32,
    /// Best apple count including this episode
    pub best_apples: u32,
    pub evaluation: bool,
    /// Mean of the final online fit loss over the episode's ticks
    pub mean_loss: f32,
    pub event: StepEvent,
    /// Cut off by the tick limit instead of a fatal move
    pub truncated: bool,
}

/// Consumer of tick snapshots
pub trait TelemetrySink {
    /// Called after every tick, before a fatal tick resets the world
    fn on_tick(&mut self, snapshot: &TickSnapshot, world: &GridWorld);
}

/// Discards all telemetry
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {
    fn on_tick(&mut self, _snapshot: &TickSnapshot, _world: &GridWorld) {}
}

/// Logs ticks through `tracing`
///
/// Every tick is a `debug` event. Ticks of evaluation episodes are logged at
/// `info` together with the board.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn on_tick(&mut self, snapshot: &TickSnapshot, world: &GridWorld) {
        if snapshot.evaluation {
            info!(
                episode = snapshot.episode,
                tick = snapshot.tick,
                action = snapshot.action.as_str(),
                reward = snapshot.reward,
                cumulative_reward = snapshot.cumulative_reward,
                apples = snapshot.apples,
                best_apples = snapshot.best_apples,
                "evaluation tick\n{}",
                render_board(world)
            );
        } else {
            debug!(
                episode = snapshot.episode,
                tick = snapshot.tick,
                action = snapshot.action.as_str(),
                explored = snapshot.explored,
                reward = snapshot.reward,
                cumulative_reward = snapshot.cumulative_reward,
                epsilon = snapshot.epsilon,
                loss = snapshot.loss,
                "tick"
            );
        }
    }
}

/// Keeps every snapshot; handy in tests
#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    pub snapshots: Vec<TickSnapshot>,
}

impl TelemetrySink for RecordingTelemetry {
    fn on_tick(&mut self, snapshot: &TickSnapshot, _world: &GridWorld) {
        self.snapshots.push(snapshot.clone());
    }
}
