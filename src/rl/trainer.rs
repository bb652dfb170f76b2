//! Online single-step Q-learning
//!
//! One tick:
//!
//! ```text
//! s  = encode_for_action(world)      q  = predict(s)
//! a  = epsilon_greedy(q)             r  = world.apply(a)
//! s' = encode_for_target(world)      q' = predict(s')
//! q[a] = r + gamma * max(q')         fit(s, q, epochs)
//! ```
//!
//! A fatal reward closes the episode and resets the world, as does reaching
//! `max_episode_ticks` when that limit is set. There is no target
//! network and no terminal masking: the TD target always bootstraps from `q'`.

use anyhow::{Result, ensure};
use rand::{SeedableRng, rngs::StdRng};

use super::approximator::{QFunction, QValues};
use super::config::DqnConfig;
use super::encoder::StateEncoder;
use super::exploration::EpsilonGreedy;
use super::replay::{ReplayMemory, Transition};
use crate::game::{GameConfig, GridWorld};
use crate::metrics::telemetry::{EpisodeSummary, TelemetrySink, TickSnapshot};

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub snapshot: TickSnapshot,
    /// Set when this tick ended the episode
    pub finished: Option<EpisodeSummary>,
}

/// Bellman target for the taken action
pub fn td_target(reward: f32, gamma: f32, next_q: &QValues) -> f32 {
    let best_next = next_q.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    reward + gamma * best_next
}

/// Drives a [`QFunction`] through the grid world one tick at a time
pub struct Trainer<Q: QFunction> {
    q_function: Q,
    world: GridWorld,
    encoder: StateEncoder,
    policy: EpsilonGreedy,
    memory: Option<ReplayMemory>,
    config: DqnConfig,
    rng: StdRng,

    /// 1-based index of the running episode
    episode: usize,
    episode_ticks: u32,
    cumulative_reward: i64,
    loss_sum: f32,
    loss_count: u32,
    best_apples: u32,
}

impl<Q: QFunction> Trainer<Q> {
    /// Create a trainer over a freshly reset grid world
    ///
    /// `seed` fixes both apple placement and exploration draws.
    pub fn new(
        q_function: Q,
        game_config: GameConfig,
        config: DqnConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        let world = GridWorld::new(game_config, seed);
        Self::from_world(q_function, world, config, seed)
    }

    /// Create a trainer over an existing grid world
    pub fn from_world(
        q_function: Q,
        world: GridWorld,
        config: DqnConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        ensure!(
            q_function.feature_len() == config.feature_layout.width(),
            "approximator expects {} features but the {:?} layout produces {}",
            q_function.feature_len(),
            config.feature_layout,
            config.feature_layout.width()
        );

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let memory = config
            .replay_enabled()
            .then(|| ReplayMemory::new(config.replay_capacity));

        Ok(Self {
            q_function,
            world,
            encoder: StateEncoder::new(config.feature_layout),
            policy: EpsilonGreedy::new(
                config.exploration_start,
                config.exploration_decay,
                config.evaluation_interval,
            ),
            memory,
            config,
            rng,
            episode: 1,
            episode_ticks: 0,
            cumulative_reward: 0,
            loss_sum: 0.0,
            loss_count: 0,
            best_apples: 0,
        })
    }

    /// Continue counting from a previous run
    ///
    /// The next episode gets index `episodes_done + 1`, so the exploration
    /// schedule picks up where it stopped.
    pub fn resume(&mut self, episodes_done: usize, best_apples: u32) {
        self.episode = episodes_done + 1;
        self.best_apples = best_apples;
    }

    /// Run one predict → act → observe → fit cycle
    pub fn step<S: TelemetrySink + ?Sized>(&mut self, sink: &mut S) -> Result<TickOutcome> {
        let episode = self.episode;
        let evaluation = self.policy.is_evaluation(episode);

        let state = self.encoder.encode_for_action(&self.world);
        let mut q_values = self.q_function.predict(&state)?;
        let selection = self.policy.select(episode, &q_values, &mut self.rng);

        let result = self.world.apply(selection.action);

        let next_state = self.encoder.encode_for_target(&self.world);
        let next_q = self.q_function.predict(&next_state)?;
        q_values[selection.action.index()] =
            td_target(result.reward as f32, self.config.gamma, &next_q);

        let stats = self
            .q_function
            .fit(&state, &q_values, self.config.fit_epochs)?;

        if let Some(memory) = self.memory.as_mut() {
            memory.push(Transition {
                state,
                action: selection.action,
                reward: result.reward as f32,
                next_state,
            });
            replay(
                &mut self.q_function,
                memory,
                &mut self.rng,
                self.config.replay_batch_size,
                self.config.gamma,
            )?;
        }

        self.episode_ticks += 1;
        self.cumulative_reward += i64::from(result.reward);
        let loss = stats.final_loss();
        if let Some(loss) = loss {
            self.loss_sum += loss;
            self.loss_count += 1;
        }

        let apples = self.world.apples();
        let truncated = !result.terminated
            && self.config.max_episode_ticks > 0
            && self.episode_ticks >= self.config.max_episode_ticks;
        if result.terminated || truncated {
            self.best_apples = self.best_apples.max(apples);
        }

        let snapshot = TickSnapshot {
            episode,
            tick: self.episode_ticks,
            action: selection.action,
            explored: selection.explored,
            reward: result.reward,
            event: result.event,
            cumulative_reward: self.cumulative_reward,
            epsilon: self.policy.epsilon(episode),
            apples,
            best_apples: self.best_apples,
            loss,
            fatal: result.terminated,
            evaluation,
        };
        sink.on_tick(&snapshot, &self.world);

        let finished = if result.terminated || truncated {
            let summary = EpisodeSummary {
                episode,
                ticks: self.episode_ticks,
                total_reward: self.cumulative_reward,
                apples,
                best_apples: self.best_apples,
                evaluation,
                mean_loss: if self.loss_count == 0 {
                    0.0
                } else {
                    self.loss_sum / self.loss_count as f32
                },
                event: result.event,
                truncated,
            };
            self.start_next_episode();
            Some(summary)
        } else {
            None
        };

        Ok(TickOutcome { snapshot, finished })
    }

    fn start_next_episode(&mut self) {
        self.world.reset();
        self.encoder.reset();
        self.episode += 1;
        self.episode_ticks = 0;
        self.cumulative_reward = 0;
        self.loss_sum = 0.0;
        self.loss_count = 0;
    }

    /// Index of the running episode
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Ticks played in the running episode
    pub fn episode_ticks(&self) -> u32 {
        self.episode_ticks
    }

    /// Number of finished episodes
    pub fn episodes_done(&self) -> usize {
        self.episode - 1
    }

    pub fn best_apples(&self) -> u32 {
        self.best_apples
    }

    pub fn is_evaluation_episode(&self) -> bool {
        self.policy.is_evaluation(self.episode)
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn q_function(&self) -> &Q {
        &self.q_function
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn memory(&self) -> Option<&ReplayMemory> {
        self.memory.as_ref()
    }
}

/// Fit a uniformly sampled batch once each with fresh TD targets
fn replay<Q: QFunction>(
    q_function: &mut Q,
    memory: &ReplayMemory,
    rng: &mut StdRng,
    batch_size: usize,
    gamma: f32,
) -> Result<()> {
    if memory.len() < batch_size {
        return Ok(());
    }

    for transition in memory.sample_batch(rng, batch_size) {
        let mut q_values = q_function.predict(&transition.state)?;
        let next_q = q_function.predict(&transition.next_state)?;
        q_values[transition.action.index()] = td_target(transition.reward, gamma, &next_q);
        q_function.fit(&transition.state, &q_values, 1)?;
    }

    Ok(())
}
