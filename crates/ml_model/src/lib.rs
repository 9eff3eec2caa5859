//! ML model crate for the iris classifier.
//!
//! Uses the Burn framework to define, train, and run inference with a
//! softmax classifier that predicts the iris species from the four
//! canned measurements.

use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::activation::softmax;

mod dataset;
mod metrics;
mod training;

pub use dataset::*;
pub use metrics::*;
pub use training::*;

/// Configuration for training the classifier.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Learning rate for the optimizer.
    pub learning_rate: f64,
    /// Number of training epochs.
    pub epochs: usize,
    /// Batch size for training.
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            epochs: 200,
            batch_size: 32,
        }
    }
}

impl TrainingConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the number of epochs.
    #[must_use]
    pub const fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// The iris classifier.
///
/// Multinomial logistic regression: a single linear layer from the four
/// measurements to three class logits.
#[derive(Module, Debug)]
pub struct IrisModel<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> IrisModel<B> {
    /// Creates a new model with freshly initialized weights.
    pub fn new(device: &B::Device) -> Self {
        let linear = LinearConfig::new(FEATURE_COUNT, CLASS_COUNT).init(device);
        Self { linear }
    }

    /// Forward pass producing unnormalized class logits.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `FEATURE_COUNT`]
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, `CLASS_COUNT`].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(input)
    }

    pub(crate) fn device(&self) -> B::Device {
        self.linear.weight.device()
    }
}

/// Creates a new model on the given device.
pub fn create_model<B: Backend>(device: &B::Device) -> IrisModel<B> {
    IrisModel::new(device)
}

/// Predicts class indices for a batch of samples.
pub fn predict_batch<B: Backend>(
    model: &IrisModel<B>,
    samples: &[[f32; FEATURE_COUNT]],
    device: &B::Device,
) -> Vec<usize> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut features_data = Vec::with_capacity(samples.len() * FEATURE_COUNT);
    for sample in samples {
        features_data.extend_from_slice(sample);
    }

    let inputs = Tensor::<B, 1>::from_floats(features_data.as_slice(), device)
        .reshape([samples.len(), FEATURE_COUNT]);

    let probabilities = softmax(model.forward(inputs), 1);

    probabilities
        .argmax(1)
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .unwrap_or_default()
        .into_iter()
        .map(|class| class as usize)
        .collect()
}

/// Saves the model checkpoint.
///
/// The recorder appends the `.mpk` extension to `path`.
///
/// # Errors
///
/// Returns an error if the checkpoint cannot be written.
pub fn save_checkpoint<B: Backend>(model: &IrisModel<B>, path: &str) -> anyhow::Result<()> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(path, &recorder)
        .map_err(|error| anyhow::anyhow!("Failed to save model checkpoint to {path}: {error}"))?;
    Ok(())
}

/// Loads a model checkpoint.
///
/// `path` is the checkpoint path without the `.mpk` extension.
///
/// # Errors
///
/// Returns an error if the checkpoint cannot be read.
pub fn load_checkpoint<B: Backend>(path: &str, device: &B::Device) -> anyhow::Result<IrisModel<B>> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    IrisModel::new(device)
        .load_file(path, &recorder, device)
        .map_err(|error| anyhow::anyhow!("Failed to load model checkpoint from {path}: {error}"))
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_model_creation() {
        let device = Default::default();
        let _model: IrisModel<TestBackend> = create_model(&device);
    }

    #[test]
    fn test_predict_batch_returns_valid_classes() {
        let device = Default::default();
        let model: IrisModel<TestBackend> = create_model(&device);

        let dataset = IrisDataset::load();
        let predictions = predict_batch(&model, &dataset.features(), &device);

        assert_eq!(predictions.len(), SAMPLE_COUNT);
        assert!(predictions.iter().all(|&class| class < CLASS_COUNT));
    }

    #[test]
    fn test_predict_empty_batch() {
        let device = Default::default();
        let model: IrisModel<TestBackend> = create_model(&device);

        let predictions = predict_batch(&model, &[], &device);
        assert!(predictions.is_empty());
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let device = Default::default();
        let model: IrisModel<TestBackend> = create_model(&device);

        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("model").to_string_lossy().to_string();

        save_checkpoint(&model, &path).expect("save checkpoint");

        let loaded: IrisModel<TestBackend> =
            load_checkpoint(&path, &device).expect("load checkpoint");

        let dataset = IrisDataset::load();
        let features = dataset.features();
        assert_eq!(
            predict_batch(&model, &features, &device),
            predict_batch(&loaded, &features, &device)
        );
    }

    #[test]
    fn test_load_checkpoint_missing_file() {
        let device = Default::default();
        let result: anyhow::Result<IrisModel<TestBackend>> =
            load_checkpoint("/nonexistent/model", &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_training_config_builder() {
        let config = TrainingConfig::new()
            .with_epochs(10)
            .with_batch_size(16)
            .with_learning_rate(0.01);

        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 16);
        assert!((config.learning_rate - 0.01).abs() < f64::EPSILON);
    }
}
