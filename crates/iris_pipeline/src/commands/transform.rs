//! Transform command - predicts classes for a CSV batch.

use std::path::Path;

use anyhow::{Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use ml_model::{load_checkpoint, predict_batch, FEATURE_COUNT};
use tracing::info;

use super::train::MODEL_FILE_STEM;

type Backend = NdArray;

/// Runs the transform command.
///
/// Reads one sample per line from the input CSV, predicts with the model
/// in `model_dir`, and writes one class index per line to the output path.
///
/// # Errors
///
/// Returns an error if the input cannot be parsed, the model cannot be
/// loaded, or the output cannot be written.
pub fn run(input: &Path, output: &Path, model_dir: &Path) -> Result<()> {
    info!(input = %input.display(), "Running batch transform");

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    let samples = parse_csv(&text)?;

    if samples.is_empty() {
        anyhow::bail!("Input {} contains no samples", input.display());
    }

    let device = NdArrayDevice::default();
    let stem = model_dir.join(MODEL_FILE_STEM);
    let model = load_checkpoint::<Backend>(&stem.to_string_lossy(), &device)?;

    let predictions = predict_batch(&model, &samples, &device);

    let mut lines = predictions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    lines.push('\n');

    std::fs::write(output, lines)
        .with_context(|| format!("Failed to write predictions to {}", output.display()))?;

    info!(
        rows = predictions.len(),
        output = %output.display(),
        "Predictions written"
    );

    Ok(())
}

/// Parses CSV rows of four comma-separated measurements.
///
/// Blank lines are skipped; malformed lines are errors.
fn parse_csv(text: &str) -> Result<Vec<[f32; FEATURE_COUNT]>> {
    let mut samples = Vec::new();

    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let values: Vec<f32> = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f32>().with_context(|| {
                    format!("Invalid value {field:?} on line {}", line_number + 1)
                })
            })
            .collect::<Result<_>>()?;

        let features: [f32; FEATURE_COUNT] = values.try_into().map_err(|_| {
            anyhow::anyhow!("Expected {FEATURE_COUNT} values on line {}", line_number + 1)
        })?;

        samples.push(features);
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::super::train;
    use super::*;

    #[test]
    fn test_parse_csv() {
        let samples = parse_csv("5.1,3.5,1.4,0.2\n\n6.3,3.3,6.0,2.5\n").expect("parse");

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], [5.1, 3.5, 1.4, 0.2]);
        assert_eq!(samples[1], [6.3, 3.3, 6.0, 2.5]);
    }

    #[test]
    fn test_parse_csv_rejects_bad_value() {
        assert!(parse_csv("5.1,abc,1.4,0.2\n").is_err());
    }

    #[test]
    fn test_parse_csv_rejects_wrong_arity() {
        assert!(parse_csv("5.1,3.5,1.4\n").is_err());
        assert!(parse_csv("5.1,3.5,1.4,0.2,9.9\n").is_err());
    }

    #[test]
    fn test_transform_end_to_end() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let model_dir = workdir.path().join("model");
        train::run(&model_dir, 5, 32, 0.05).expect("training should succeed");

        let input = workdir.path().join("batch.csv");
        std::fs::write(&input, "5.1,3.5,1.4,0.2\n6.2,2.9,4.3,1.3\n7.3,2.9,6.3,1.8\n")
            .expect("write input");

        let output = workdir.path().join("batch.csv.out");
        run(&input, &output, &model_dir).expect("transform should succeed");

        let written = std::fs::read_to_string(&output).expect("read output");
        let classes: Vec<usize> = written
            .lines()
            .map(|line| line.parse().expect("class index"))
            .collect();

        assert_eq!(classes.len(), 3);
        assert!(classes.iter().all(|&class| class < 3));
    }

    #[test]
    fn test_transform_rejects_empty_input() {
        let workdir = tempfile::tempdir().expect("create temp dir");
        let input = workdir.path().join("empty.csv");
        std::fs::write(&input, "\n\n").expect("write input");

        let result = run(
            &input,
            &workdir.path().join("out"),
            &workdir.path().join("model"),
        );
        assert!(result.is_err());
    }
}
