//! Bounded replay memory
//!
//! Stores observed transitions in a ring buffer and samples them uniformly
//! with replacement. The training loop only touches it when replay is enabled
//! in [`DqnConfig`](super::DqnConfig).

use rand::Rng;
use std::collections::VecDeque;

use super::encoder::FeatureVector;
use crate::game::Direction;

/// One observed step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: FeatureVector,
    pub action: Direction,
    pub reward: f32,
    pub next_state: FeatureVector,
}

/// Ring buffer of transitions
///
/// # Example
///
/// ```rust
/// use snake_dqn::game::Direction;
/// use snake_dqn::rl::{FeatureVector, ReplayMemory, Transition};
///
/// let mut memory = ReplayMemory::new(2);
/// for reward in [1.0, 2.0, 3.0] {
///     memory.push(Transition {
///         state: FeatureVector::new(vec![0.0; 6]),
///         action: Direction::Up,
///         reward,
///         next_state: FeatureVector::new(vec![0.0; 6]),
///     });
/// }
///
/// // The oldest transition was evicted
/// assert_eq!(memory.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayMemory {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a transition, evicting the oldest one when full
    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Draw `batch_size` transitions uniformly with replacement
    ///
    /// Returns an empty batch when the memory is empty.
    pub fn sample_batch<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        batch_size: usize,
    ) -> Vec<&Transition> {
        if self.transitions.is_empty() {
            return Vec::new();
        }

        (0..batch_size)
            .map(|_| &self.transitions[rng.gen_range(0..self.transitions.len())])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
