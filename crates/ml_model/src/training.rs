//! Training loop for the iris classifier.

use burn::data::dataset::Dataset;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use tracing::info;

use crate::dataset::{IrisBatcher, IrisDataset};
use crate::{IrisModel, TrainingConfig};

/// Output from training.
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    /// Mean loss of the final epoch.
    pub final_loss: f32,
    /// Number of epochs completed.
    pub epochs_completed: usize,
}

/// Trains the model on the dataset.
///
/// Cross-entropy loss with the Adam optimizer, shuffling between epochs.
///
/// # Arguments
///
/// * `model` - The model to train (modified in place).
/// * `dataset` - The training dataset.
/// * `config` - Training configuration.
///
/// # Errors
///
/// Returns an error if the dataset is empty or the batch size is zero.
pub fn train<B: AutodiffBackend>(
    model: &mut IrisModel<B>,
    dataset: &IrisDataset,
    config: &TrainingConfig,
) -> anyhow::Result<TrainingOutput> {
    if dataset.is_empty() {
        return Err(anyhow::anyhow!("No training data provided"));
    }
    if config.batch_size == 0 {
        return Err(anyhow::anyhow!("Batch size must be non-zero"));
    }

    let device = model.device();
    let batcher = IrisBatcher::<B>::new(device.clone());
    let loss_fn = CrossEntropyLossConfig::new().init(&device);

    let mut optimizer = AdamConfig::new().init();
    let mut final_loss = 0.0;

    for epoch in 0..config.epochs {
        let mut epoch_loss = 0.0;
        let mut batch_count = 0;

        let num_samples = dataset.len();
        let mut indices: Vec<usize> = (0..num_samples).collect();

        // Shuffle indices using epoch as seed
        shuffle_indices(&mut indices, epoch as u64);

        for batch_start in (0..num_samples).step_by(config.batch_size) {
            let batch_end = (batch_start + config.batch_size).min(num_samples);
            let Some(batch_indices) = indices.get(batch_start..batch_end) else {
                continue;
            };

            let items: Vec<_> = batch_indices
                .iter()
                .filter_map(|&i| dataset.get(i))
                .collect();

            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items);

            // Forward pass
            let logits = model.forward(batch.inputs);
            let loss = loss_fn.forward(logits, batch.targets);

            let loss_value: f32 = loss
                .clone()
                .into_data()
                .to_vec()
                .unwrap_or_else(|_| vec![0.0])
                .first()
                .copied()
                .unwrap_or(0.0);

            epoch_loss += f64::from(loss_value);
            batch_count += 1;

            // Backward pass
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, model);

            // Update weights
            *model = optimizer.step(config.learning_rate, model.clone(), grads);
        }

        final_loss = if batch_count > 0 {
            (epoch_loss / f64::from(batch_count)) as f32
        } else {
            0.0
        };

        if epoch % 20 == 0 || epoch == config.epochs - 1 {
            info!(epoch = epoch + 1, loss = final_loss, "Training progress");
        }
    }

    Ok(TrainingOutput {
        final_loss,
        epochs_completed: config.epochs,
    })
}

/// Shuffles indices using a simple LCG-based shuffle.
fn shuffle_indices(indices: &mut [usize], seed: u64) {
    // Fisher-Yates with LCG random
    let mut rng_state = seed.wrapping_add(12345);

    for i in (1..indices.len()).rev() {
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = ((rng_state >> 33) as usize) % (i + 1);
        indices.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::{Autodiff, NdArray};

    use super::*;
    use crate::predict_batch;

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_training_converges() {
        let device = NdArrayDevice::default();
        let mut model: IrisModel<TestBackend> = IrisModel::new(&device);

        let dataset = IrisDataset::load();
        let config = TrainingConfig::new().with_epochs(50).with_batch_size(32);

        let output = train(&mut model, &dataset, &config).expect("training should succeed");

        assert_eq!(output.epochs_completed, 50);
        assert!(output.final_loss.is_finite());

        // The separable canned dataset should be learned well past chance level
        let predictions = predict_batch(&model, &dataset.features(), &device);
        let labels = dataset.labels();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|(p, t)| p == t)
            .count();
        let accuracy = correct as f64 / labels.len() as f64;
        assert!(accuracy > 0.5, "accuracy {accuracy} not above chance");
    }

    #[test]
    fn test_training_rejects_zero_batch_size() {
        let device = NdArrayDevice::default();
        let mut model: IrisModel<TestBackend> = IrisModel::new(&device);

        let dataset = IrisDataset::load();
        let config = TrainingConfig::new().with_epochs(1).with_batch_size(0);

        assert!(train(&mut model, &dataset, &config).is_err());
    }

    #[test]
    fn test_shuffle_indices() {
        let mut indices: Vec<usize> = (0..10).collect();
        let original = indices.clone();

        shuffle_indices(&mut indices, 42);

        // Should be permuted (very unlikely to be the same)
        assert_ne!(indices, original, "Shuffle should change order");

        // Should contain the same elements
        indices.sort_unstable();
        assert_eq!(indices, original, "Shuffle should preserve elements");
    }
}
