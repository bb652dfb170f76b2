//! Function approximator seam
//!
//! The training loop only ever asks two things of the approximator: predict
//! the Q-values of one feature vector, and fit one feature vector towards a
//! target Q-vector for a few epochs. [`BurnQFunction`] does both with a
//! [`QNetwork`], Adam and a mean-squared-error loss.

use anyhow::{Result, anyhow, ensure};
use burn::{
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, Tensor, TensorData, backend::AutodiffBackend, backend::Backend},
};

use super::encoder::FeatureVector;
use super::network::{QNetwork, QNetworkConfig};
use crate::game::NUM_ACTIONS;

/// One Q-value per action, in action-index order
pub type QValues = [f32; NUM_ACTIONS];

/// Outcome of a fit call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitStats {
    /// Loss measured at the start of each epoch
    pub loss_history: Vec<f32>,
}

impl FitStats {
    pub fn final_loss(&self) -> Option<f32> {
        self.loss_history.last().copied()
    }
}

/// Q-value predictor and trainer
///
/// A feature vector whose width differs from [`feature_len`](QFunction::feature_len)
/// is a contract violation and is reported as an error.
pub trait QFunction {
    /// Width of the feature vectors this approximator accepts
    fn feature_len(&self) -> usize;

    /// Predict the Q-values of a single state
    fn predict(&self, features: &FeatureVector) -> Result<QValues>;

    /// Move the prediction for `features` towards `targets`
    fn fit(&mut self, features: &FeatureVector, targets: &QValues, epochs: usize)
        -> Result<FitStats>;
}

/// [`QFunction`] backed by a burn [`QNetwork`]
pub struct BurnQFunction<B: AutodiffBackend> {
    network: QNetwork<B>,
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    network_config: QNetworkConfig,
    learning_rate: f64,
    /// Number of fit calls so far
    fits: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> BurnQFunction<B> {
    /// Create an approximator with a freshly initialized network
    pub fn new(network_config: QNetworkConfig, learning_rate: f64, device: B::Device) -> Self {
        let network = network_config.init::<B>(&device);
        Self::from_network(network, network_config, learning_rate, device)
    }

    /// Wrap an existing network, e.g. one loaded from disk
    pub fn from_network(
        network: QNetwork<B>,
        network_config: QNetworkConfig,
        learning_rate: f64,
        device: B::Device,
    ) -> Self {
        Self {
            network,
            optim: AdamConfig::new().init(),
            network_config,
            learning_rate,
            fits: 0,
            device,
        }
    }

    fn check_width(&self, features: &FeatureVector) -> Result<()> {
        ensure!(
            features.len() == self.network_config.input_dim,
            "feature vector has {} values, the Q-network expects {}",
            features.len(),
            self.network_config.input_dim
        );
        Ok(())
    }

    fn features_tensor<BT: Backend<Device = B::Device>>(
        &self,
        features: &FeatureVector,
    ) -> Tensor<BT, 2> {
        let data = TensorData::new(features.as_slice().to_vec(), [1, features.len()]);
        Tensor::from_data(data, &self.device)
    }

    pub fn network(&self) -> &QNetwork<B> {
        &self.network
    }

    pub fn network_config(&self) -> &QNetworkConfig {
        &self.network_config
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn fits(&self) -> usize {
        self.fits
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: AutodiffBackend> QFunction for BurnQFunction<B> {
    fn feature_len(&self) -> usize {
        self.network_config.input_dim
    }

    fn predict(&self, features: &FeatureVector) -> Result<QValues> {
        self.check_width(features)?;

        // Forward pass in valid (no-grad) mode
        let network = self.network.clone().valid();
        let input = self.features_tensor::<B::InnerBackend>(features);
        let output = network.forward(input);

        let values: Vec<f32> = output
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("failed to read Q-values: {:?}", e))?;

        values.try_into().map_err(|v: Vec<f32>| {
            anyhow!("Q-network returned {} values, expected {}", v.len(), NUM_ACTIONS)
        })
    }

    fn fit(
        &mut self,
        features: &FeatureVector,
        targets: &QValues,
        epochs: usize,
    ) -> Result<FitStats> {
        self.check_width(features)?;

        let input = self.features_tensor::<B>(features);
        let target = Tensor::<B, 2>::from_data(
            TensorData::new(targets.to_vec(), [1, NUM_ACTIONS]),
            &self.device,
        );
        let loss_fn = MseLoss::new();

        let mut loss_history = Vec::with_capacity(epochs);
        for _epoch in 0..epochs {
            let prediction = self.network.forward(input.clone());
            let loss = loss_fn.forward(prediction, target.clone(), Reduction::Mean);
            loss_history.push(loss.clone().into_scalar().elem::<f32>());

            let grads = GradientsParams::from_grads(loss.backward(), &self.network);
            self.network = self
                .optim
                .step(self.learning_rate, self.network.clone(), grads);
        }

        self.fits += 1;
        Ok(FitStats { loss_history })
    }
}
