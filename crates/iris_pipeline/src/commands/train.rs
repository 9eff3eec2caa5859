//! Train command - fits the classifier on the canned dataset.

use std::path::Path;

use anyhow::{Context, Result};
use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use ml_model::{create_model, save_checkpoint, train, IrisDataset, TrainingConfig};
use tracing::info;

type TrainBackend = Autodiff<NdArray>;

/// Checkpoint file stem within the model directory. The recorder appends
/// the `.mpk` extension.
pub const MODEL_FILE_STEM: &str = "model";

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if training fails or the checkpoint cannot be written.
pub fn run(
    model_dir: &Path,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
) -> Result<()> {
    info!("Starting training");

    let dataset = IrisDataset::load();
    info!(samples = dataset.features().len(), "Loaded dataset");

    let config = TrainingConfig::new()
        .with_epochs(epochs)
        .with_batch_size(batch_size)
        .with_learning_rate(learning_rate);

    let device = Default::default();
    let mut model = create_model::<TrainBackend>(&device);

    info!(epochs, batch_size, learning_rate, "Training model");
    let output = train(&mut model, &dataset, &config)?;
    info!(
        final_loss = output.final_loss,
        epochs = output.epochs_completed,
        "Model training complete"
    );

    std::fs::create_dir_all(model_dir)
        .with_context(|| format!("Failed to create model directory {}", model_dir.display()))?;

    let checkpoint_path = model_dir.join(MODEL_FILE_STEM);
    save_checkpoint(&model.valid(), &checkpoint_path.to_string_lossy())?;

    info!(path = %checkpoint_path.display(), "Model saved");

    Ok(())
}
