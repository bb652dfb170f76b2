//! Q-network for the Snake agent
//!
//! A plain multi-layer perceptron mapping a feature vector to one Q-value per
//! action.
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, L]          (L = 6 or 9)
//!   ↓ Linear(L → 512) + ReLU
//!   ↓ Linear(512 → 512) + ReLU
//!   ↓ Linear(512 → 4)        (linear output)
//! Output: [batch, 4]         (Q(up), Q(down), Q(left), Q(right))
//! ```
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::QNetworkConfig;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::new(9).init::<Backend>(&device);
//!
//! let q_values = network.forward(Tensor::zeros([2, 9], &device));
//! assert_eq!(q_values.dims(), [2, 4]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};
use serde::{Deserialize, Serialize};

use crate::game::NUM_ACTIONS;

/// Configuration for the Q-network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    /// Width of the feature vector
    pub input_dim: usize,

    /// Width of both hidden layers (default: 512)
    pub hidden_dim: usize,

    /// Number of Q-values produced (default: 4)
    pub num_actions: usize,
}

impl QNetworkConfig {
    /// Create a new configuration with default hidden width
    pub fn new(input_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim: 512,
            num_actions: NUM_ACTIONS,
        }
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    /// Initialize the Q-network from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            q_head: LinearConfig::new(self.hidden_dim, self.num_actions).init(device),
        }
    }
}

/// Feed-forward Q-network
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    /// Linear output, one unit per action
    q_head: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: `[batch, L]` features to `[batch, 4]` Q-values
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(features));
        let x = relu(self.fc2.forward(x));
        self.q_head.forward(x)
    }
}
