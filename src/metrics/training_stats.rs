//! Rolling training statistics
//!
//! Aggregates finished episodes into smoothed reward, length, apple and loss
//! figures for the periodic progress line of the train mode.

use std::collections::VecDeque;

use super::telemetry::EpisodeSummary;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use snake_dqn::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
/// stats.record_episode(13.0, 42, 1, 0.25);
///
/// assert_eq!(stats.total_episodes(), 1);
/// assert_eq!(stats.best_apples(), 1);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Total reward per episode (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Ticks per episode (rolling window)
    episode_lengths: VecDeque<u32>,

    /// Apples eaten per episode (rolling window)
    episode_apples: VecDeque<u32>,

    /// Mean fit loss per episode (rolling window)
    episode_losses: VecDeque<f32>,

    total_episodes: usize,
    total_ticks: u64,
    best_apples: u32,

    /// Greedy evaluation results, most recent last
    evaluations: Vec<(usize, u32)>,

    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker averaging over the last `window_size` episodes
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_apples: VecDeque::with_capacity(window_size),
            episode_losses: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_ticks: 0,
            best_apples: 0,
            evaluations: Vec::new(),
            window_size,
        }
    }

    /// Record a finished episode
    pub fn record_episode(&mut self, reward: f32, ticks: u32, apples: u32, mean_loss: f32) {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, ticks, self.window_size);
        Self::push_deque(&mut self.episode_apples, apples, self.window_size);
        Self::push_deque(&mut self.episode_losses, mean_loss, self.window_size);
        self.total_episodes += 1;
        self.total_ticks += u64::from(ticks);
        self.best_apples = self.best_apples.max(apples);
    }

    /// Record a finished episode from the trainer's summary
    ///
    /// Evaluation episodes are additionally kept in the evaluation history.
    pub fn record_summary(&mut self, summary: &EpisodeSummary) {
        self.record_episode(
            summary.total_reward as f32,
            summary.ticks,
            summary.apples,
            summary.mean_loss,
        );
        if summary.evaluation {
            self.evaluations.push((summary.episode, summary.apples));
        }
    }

    pub fn mean_episode_reward(&self) -> f32 {
        Self::mean(self.episode_rewards.iter().copied())
    }

    pub fn mean_episode_length(&self) -> f32 {
        Self::mean(self.episode_lengths.iter().map(|&l| l as f32))
    }

    pub fn mean_episode_apples(&self) -> f32 {
        Self::mean(self.episode_apples.iter().map(|&a| a as f32))
    }

    pub fn mean_loss(&self) -> f32 {
        Self::mean(self.episode_losses.iter().copied())
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn best_apples(&self) -> u32 {
        self.best_apples
    }

    /// `(episode, apples)` of every evaluation episode seen
    pub fn evaluations(&self) -> &[(usize, u32)] {
        &self.evaluations
    }

    /// Apples eaten by the most recent evaluation episode
    pub fn last_evaluation(&self) -> Option<u32> {
        self.evaluations.last().map(|&(_, apples)| apples)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line progress summary
    pub fn format_summary(&self) -> String {
        let last_eval = self
            .last_evaluation()
            .map_or_else(|| "-".to_string(), |apples| apples.to_string());
        format!(
            "Episodes: {} | Ticks: {} | Reward: {:.2} | Apples: {:.2} | Best: {} | Eval: {} | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_ticks,
            self.mean_episode_reward(),
            self.mean_episode_apples(),
            self.best_apples,
            last_eval,
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    fn mean(values: impl ExactSizeIterator<Item = f32>) -> f32 {
        let len = values.len();
        if len == 0 {
            0.0
        } else {
            values.sum::<f32>() / len as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::StepEvent;

    fn summary(episode: usize, apples: u32, evaluation: bool) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            ticks: 20,
            total_reward: 5,
            apples,
            best_apples: apples,
            evaluation,
            mean_loss: 0.5,
            event: StepEvent::HitWall,
            truncated: false,
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrainingStats::new(100);

        assert_eq!(stats.total_episodes(), 0);
        assert_eq!(stats.mean_episode_reward(), 0.0);
        assert_eq!(stats.mean_episode_length(), 0.0);
        assert_eq!(stats.mean_loss(), 0.0);
        assert_eq!(stats.last_evaluation(), None);
    }

    #[test]
    fn test_record_episode() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(-12.0, 8, 0, 1.5);

        assert_eq!(stats.total_episodes(), 1);
        assert_eq!(stats.total_ticks(), 8);
        assert!((stats.mean_episode_reward() + 12.0).abs() < 1e-5);
        assert!((stats.mean_episode_length() - 8.0).abs() < 1e-5);
        assert!((stats.mean_loss() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_average_evicts_oldest() {
        let mut stats = TrainingStats::new(3);

        stats.record_episode(1.0, 10, 1, 0.0);
        stats.record_episode(2.0, 20, 2, 0.0);
        stats.record_episode(3.0, 30, 3, 0.0);
        assert!((stats.mean_episode_reward() - 2.0).abs() < 1e-5);

        stats.record_episode(4.0, 40, 0, 0.0);

        assert_eq!(stats.total_episodes(), 4);
        assert_eq!(stats.total_ticks(), 100);
        assert!((stats.mean_episode_reward() - 3.0).abs() < 1e-5);
        // Best survives eviction
        assert_eq!(stats.best_apples(), 3);
    }

    #[test]
    fn test_evaluation_history() {
        let mut stats = TrainingStats::new(10);
        stats.record_summary(&summary(99, 1, false));
        stats.record_summary(&summary(100, 2, true));
        stats.record_summary(&summary(101, 5, false));

        assert_eq!(stats.evaluations(), &[(100, 2)]);
        assert_eq!(stats.last_evaluation(), Some(2));
        assert_eq!(stats.best_apples(), 5);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = TrainingStats::new(100);
        stats.record_summary(&summary(100, 2, true));

        let line = stats.format_summary();
        assert!(line.contains("Episodes: 1"));
        assert!(line.contains("Ticks: 20"));
        assert!(line.contains("Reward: 5.00"));
        assert!(line.contains("Best: 2"));
        assert!(line.contains("Eval: 2"));
        assert!(line.contains("Loss: 0.5000"));
    }
}
