//! Small-scale end-to-end check of the training and evaluation runners.
//!
//! 1. Train for a few epochs into a scratch directory
//! 2. Evaluate the checkpoint and write the report
//! 3. Verify the report parses and the metrics are sane

use anyhow::{Context, Result};
use pipeline_structs::EvaluationReport;
use tracing::info;

/// Runs the smoke command.
///
/// # Errors
///
/// Returns an error if a stage fails or a metric is out of range.
pub fn run(epochs: usize) -> Result<()> {
    info!("=== Pipeline smoke run ===");

    let workdir = tempfile::tempdir().context("Failed to create working directory")?;
    let model_dir = workdir.path().join("model");
    let output_dir = workdir.path().join("output");

    info!("Step 1: Training...");
    super::train::run(&model_dir, epochs, 32, 0.05)?;

    info!("Step 2: Evaluating...");
    super::evaluate::run(&model_dir, &output_dir)?;

    info!("Step 3: Checking the report...");
    let report_path = output_dir.join("evaluation.json");
    let raw = std::fs::read_to_string(&report_path)
        .with_context(|| format!("Failed to read {}", report_path.display()))?;
    let report: EvaluationReport =
        serde_json::from_str(&raw).context("Failed to parse evaluation report")?;

    let metrics = [
        ("accuracy", report.metrics.accuracy.value),
        ("precision", report.metrics.precision.value),
        ("recall", report.metrics.recall.value),
        ("f1_score", report.metrics.f1_score.value),
    ];

    let mut all_passed = true;
    for (name, value) in metrics {
        if (0.0..=1.0).contains(&value) {
            info!("PASS: {name} in range ({value:.4})");
        } else {
            info!("FAIL: {name} out of range ({value:.4})");
            all_passed = false;
        }
    }

    if all_passed {
        info!("=== All sanity checks passed ===");
        Ok(())
    } else {
        anyhow::bail!("Smoke run failed, review the output above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke_run() {
        run(5).expect("smoke run should pass");
    }
}
