//! Epsilon-greedy action selection with a linear schedule

use rand::Rng;

use super::approximator::QValues;
use crate::game::{Direction, NUM_ACTIONS};

/// How an action was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub action: Direction,
    /// True when the action came from the random branch
    pub explored: bool,
}

/// Epsilon-greedy policy
///
/// `epsilon(episode) = start - episode * decay`, unclamped. Every
/// `evaluation_interval`-th episode is greedy regardless of epsilon.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    start: f64,
    decay: f64,
    evaluation_interval: usize,
}

impl EpsilonGreedy {
    pub fn new(start: f64, decay: f64, evaluation_interval: usize) -> Self {
        Self {
            start,
            decay,
            evaluation_interval: evaluation_interval.max(1),
        }
    }

    /// Exploration rate for an episode; may go negative
    pub fn epsilon(&self, episode: usize) -> f64 {
        self.start - episode as f64 * self.decay
    }

    /// Whether the episode is a greedy evaluation episode
    pub fn is_evaluation(&self, episode: usize) -> bool {
        episode % self.evaluation_interval == 0
    }

    /// Pick an action for the given Q-values
    pub fn select<R: Rng + ?Sized>(
        &self,
        episode: usize,
        q_values: &QValues,
        rng: &mut R,
    ) -> Selection {
        if !self.is_evaluation(episode) && rng.gen::<f64>() < self.epsilon(episode) {
            let idx = rng.gen_range(0..NUM_ACTIONS);
            return Selection {
                action: Direction::ALL[idx],
                explored: true,
            };
        }

        Selection {
            action: Direction::ALL[argmax(q_values)],
            explored: false,
        }
    }
}

/// Index of the largest Q-value; the first maximum wins and NaN never wins
pub fn argmax(q_values: &QValues) -> usize {
    let mut best = 0;
    for (idx, &value) in q_values.iter().enumerate().skip(1) {
        if value > q_values[best] || q_values[best].is_nan() {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_epsilon_schedule() {
        let policy = EpsilonGreedy::new(0.3, 0.0001, 100);
        assert!((policy.epsilon(0) - 0.3).abs() < 1e-12);
        assert!((policy.epsilon(1000) - 0.2).abs() < 1e-12);
        // Never clamped
        assert!(policy.epsilon(5000) < 0.0);
    }

    #[test]
    fn test_evaluation_episodes() {
        let policy = EpsilonGreedy::new(0.3, 0.0001, 100);
        assert!(policy.is_evaluation(0));
        assert!(policy.is_evaluation(100));
        assert!(!policy.is_evaluation(1));
        assert!(!policy.is_evaluation(199));
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.1, 0.6, 0.2, 0.1]), 1);
        assert_eq!(argmax(&[0.5, 0.5, 0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.0, 2.0, 2.0, 1.0]), 1);
        assert_eq!(argmax(&[f32::NAN, -1.0, 3.0, 2.0]), 2);
    }

    #[test]
    fn test_evaluation_episode_is_greedy() {
        let policy = EpsilonGreedy::new(1.0, 0.0, 10);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let selection = policy.select(20, &[0.0, 0.0, 0.0, 1.0], &mut rng);
            assert_eq!(selection.action, Direction::Right);
            assert!(!selection.explored);
        }
    }

    #[test]
    fn test_full_exploration_is_random() {
        let policy = EpsilonGreedy::new(1.5, 0.0, 10);
        let mut rng = StdRng::seed_from_u64(0);
        let mut seen = [false; NUM_ACTIONS];
        for _ in 0..200 {
            let selection = policy.select(3, &[0.0, 0.0, 0.0, 1.0], &mut rng);
            assert!(selection.explored);
            seen[selection.action.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_negative_epsilon_never_explores() {
        let policy = EpsilonGreedy::new(0.3, 0.0001, 100_000);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let selection = policy.select(4001, &[0.0, 1.0, 0.0, 0.0], &mut rng);
            assert!(!selection.explored);
            assert_eq!(selection.action, Direction::Down);
        }
    }
}
