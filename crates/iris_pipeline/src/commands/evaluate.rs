//! Evaluate command - scores a trained model and writes the report.

use std::path::Path;

use anyhow::{Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use flate2::read::GzDecoder;
use ml_model::{
    classification_scores, load_checkpoint, predict_batch, IrisDataset, IrisModel, CLASS_COUNT,
};
use pipeline_structs::EvaluationReport;
use tracing::{info, warn};

use super::train::MODEL_FILE_STEM;

type Backend = NdArray;

/// Archived form of the model artifact some platforms deliver.
const MODEL_ARCHIVE: &str = "model.tar.gz";

/// Runs the evaluate command.
///
/// Loads the checkpoint from the model channel, predicts the full canned
/// dataset, and writes `evaluation.json` to the output directory.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded or the report cannot be
/// written.
pub fn run(model_channel: &Path, output_dir: &Path) -> Result<()> {
    info!("Starting evaluation");
    info!(model_channel = %model_channel.display(), "Model channel");

    let device = NdArrayDevice::default();
    let model = load_model(model_channel, &device)?;
    info!("Model loaded");

    let dataset = IrisDataset::load();
    let features = dataset.features();
    info!(samples = features.len(), "Loaded dataset for evaluation");

    let predictions = predict_batch(&model, &features, &device);
    let scores = classification_scores(&dataset.labels(), &predictions, CLASS_COUNT);

    info!("Accuracy:  {:.4}", scores.accuracy);
    info!("Precision: {:.4}", scores.precision);
    info!("Recall:    {:.4}", scores.recall);
    info!("F1 Score:  {:.4}", scores.f1_score);

    let report = EvaluationReport::new(
        scores.accuracy,
        scores.precision,
        scores.recall,
        scores.f1_score,
    );

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let report_path = output_dir.join("evaluation.json");
    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize evaluation report")?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;

    info!(path = %report_path.display(), "Evaluation report saved");

    Ok(())
}

/// Loads the model from the channel directory.
///
/// Falls back to extracting `model.tar.gz` in place when the checkpoint is
/// missing; any other failure propagates unchanged.
fn load_model(model_channel: &Path, device: &NdArrayDevice) -> Result<IrisModel<Backend>> {
    let stem = model_channel.join(MODEL_FILE_STEM);
    let stem_str = stem.to_string_lossy();

    match load_checkpoint(&stem_str, device) {
        Ok(model) => Ok(model),
        Err(error) => {
            let archive_path = model_channel.join(MODEL_ARCHIVE);
            if archive_path.exists() {
                warn!(
                    archive = %archive_path.display(),
                    "Checkpoint missing, extracting archive"
                );
                extract_model_archive(&archive_path, model_channel)?;
                load_checkpoint(&stem_str, device)
            } else {
                Err(error)
            }
        }
    }
}

/// Extracts a gzipped tar archive into the destination directory.
fn extract_model_archive(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;

    let decoder = GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);

    archive
        .unpack(destination)
        .with_context(|| format!("Failed to extract {}", archive_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::super::train;
    use super::*;

    fn train_into(model_dir: &Path) {
        train::run(model_dir, 5, 32, 0.05).expect("training should succeed");
    }

    /// Packs the checkpoint from `model_dir` into `model.tar.gz` under
    /// `channel`, leaving no bare checkpoint there.
    fn pack_archive(model_dir: &Path, channel: &Path) {
        std::fs::create_dir_all(channel).expect("create channel dir");

        let archive_file =
            std::fs::File::create(channel.join(MODEL_ARCHIVE)).expect("create archive");
        let encoder = GzEncoder::new(archive_file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let checkpoint = model_dir.join("model.mpk");
        builder
            .append_path_with_name(&checkpoint, "model.mpk")
            .expect("append checkpoint");
        builder
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip");
    }

    #[test]
    fn test_evaluate_writes_report_with_metrics_in_range() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let model_dir = workdir.path().join("model");
        let output_dir = workdir.path().join("output");

        train_into(&model_dir);
        run(&model_dir, &output_dir).expect("evaluation should succeed");

        let raw = std::fs::read_to_string(output_dir.join("evaluation.json"))
            .expect("report should exist");
        let report: EvaluationReport = serde_json::from_str(&raw).expect("parse report");

        for value in [
            report.metrics.accuracy.value,
            report.metrics.precision.value,
            report.metrics.recall.value,
            report.metrics.f1_score.value,
        ] {
            assert!((0.0..=1.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let model_dir = workdir.path().join("model");
        let output_dir = workdir.path().join("output");

        train_into(&model_dir);

        run(&model_dir, &output_dir).expect("first evaluation");
        let first = std::fs::read(output_dir.join("evaluation.json")).expect("first report");

        run(&model_dir, &output_dir).expect("second evaluation");
        let second = std::fs::read(output_dir.join("evaluation.json")).expect("second report");

        assert_eq!(first, second, "re-evaluation should write an identical report");
    }

    #[test]
    fn test_evaluate_falls_back_to_archive() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let model_dir = workdir.path().join("model");
        let channel = workdir.path().join("channel");
        let output_dir = workdir.path().join("output");

        train_into(&model_dir);
        pack_archive(&model_dir, &channel);

        // Only the archive is present in the channel
        assert!(!channel.join("model.mpk").exists());

        run(&channel, &output_dir).expect("evaluation should extract the archive");

        assert!(channel.join("model.mpk").exists());
        assert!(output_dir.join("evaluation.json").exists());
    }

    #[test]
    fn test_evaluate_fails_without_model_or_archive() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let empty = workdir.path().join("empty");
        std::fs::create_dir_all(&empty).expect("create dir");

        let result = run(&empty, &workdir.path().join("output"));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_model_archive_roundtrip() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let source = workdir.path().join("source");
        std::fs::create_dir_all(&source).expect("create source dir");
        std::fs::write(source.join("model.mpk"), b"checkpoint bytes").expect("write file");

        let channel = workdir.path().join("channel");
        pack_archive(&source, &channel);

        let destination = workdir.path().join("destination");
        std::fs::create_dir_all(&destination).expect("create destination dir");

        extract_model_archive(&channel.join(MODEL_ARCHIVE), &destination)
            .expect("extraction should succeed");

        let extracted =
            std::fs::read(destination.join("model.mpk")).expect("extracted file should exist");
        assert_eq!(extracted, b"checkpoint bytes");
    }
}
