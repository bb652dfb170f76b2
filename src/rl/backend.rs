//! Backend type aliases and device management
//!
//! The Q-network is a small MLP over a 6- or 9-wide feature vector, so the
//! CPU NdArray backend is all the training loop needs.
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::{QNetworkConfig, TrainingBackend, default_device};
//!
//! let device = default_device();
//! let network = QNetworkConfig::new(9).init::<TrainingBackend>(&device);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend type for training (with autodiff)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend type for inference (without autodiff)
///
/// Used by the watch mode, which only ever runs forward passes.
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_device_calls() {
        let device1 = default_device();
        let device2 = default_device();
        assert_eq!(
            std::mem::discriminant(&device1),
            std::mem::discriminant(&device2)
        );
    }
}
