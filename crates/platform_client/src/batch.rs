//! Batch-inference driver.
//!
//! Submits a transform job against the latest approved model and polls it
//! to a terminal state, then fetches and prints the predictions.

use core::future::Future;
use core::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Utc;
use config::{CONFIG, OBJECT_STORE};
use object_store::path::Path as ObjectStorePath;
use object_store::ObjectStore;
use pipeline_structs::TransformJobStatus;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::client::PlatformClient;
use crate::api::models::{CreateTransformJobRequest, TransformJobDescription};

/// Fixed polling interval for transform job status.
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Instance type used for batch-transform jobs.
const TRANSFORM_INSTANCE_TYPE: &str = "ml.c6i.large";

/// Species names indexed by predicted class.
const SPECIES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Canned test batch with samples of all three species.
const TEST_ROWS: [[f32; 4]; 10] = [
    [5.1, 3.5, 1.4, 0.2],
    [6.2, 2.9, 4.3, 1.3],
    [7.3, 2.9, 6.3, 1.8],
    [4.9, 3.0, 1.4, 0.2],
    [6.4, 3.2, 4.5, 1.5],
    [6.3, 3.3, 6.0, 2.5],
    [5.0, 3.6, 1.4, 0.2],
    [5.9, 3.0, 5.1, 1.8],
    [6.7, 3.1, 4.4, 1.4],
    [7.7, 2.8, 6.7, 2.0],
];

/// Runs the complete batch-inference process.
///
/// # Errors
///
/// Returns an error if no approved model exists, if any platform call
/// fails, or if the job ends in a non-success terminal state.
pub async fn run() -> Result<()> {
    let client = PlatformClient::new()?;

    // Latest approved model from the registry
    info!(group = %CONFIG.model_group_name, "Looking up latest approved model");
    let package = client
        .latest_approved_model_package(&CONFIG.model_group_name)
        .await?
        .context("No approved models in the registry")?;
    info!(model_package = %package.id, "Using model package");

    let details = client.describe_model_package(&package.id).await?;
    info!(
        status = details.status.as_deref().unwrap_or("N/A"),
        approval_status = %details.approval_status,
        containers = details.containers.len(),
        "Model package details"
    );
    for container in &details.containers {
        info!(
            image = %container.image,
            model_data_url = container.model_data_url.as_deref().unwrap_or("N/A"),
            "Inference container"
        );
    }

    // Upload the test batch
    let timestamp = Utc::now().timestamp();
    let input_key = format!("batch-input/test-{timestamp}.csv");
    let payload = Bytes::from(format_batch_csv(&TEST_ROWS));

    OBJECT_STORE
        .put(&ObjectStorePath::from(input_key.clone()), payload.into())
        .await
        .context("Failed to upload batch input")?;
    info!(input = %input_key, rows = TEST_ROWS.len(), "Test batch uploaded");

    // Submit the transform job
    let job_name = format!("iris-batch-{}", Uuid::new_v4());
    let request = CreateTransformJobRequest {
        job_name: job_name.clone(),
        model_package_id: package.id.clone(),
        input_path: input_key,
        output_path: String::from("batch-output/"),
        content_type: String::from("text/csv"),
        accept: String::from("text/csv"),
        split_type: String::from("Line"),
        instance_type: String::from(TRANSFORM_INSTANCE_TYPE),
        instance_count: 1,
    };
    client.create_transform_job(&request).await?;
    info!(job_name = %job_name, "Transform job submitted, waiting for completion");

    let description = poll_until_terminal(|| client.describe_transform_job(&job_name)).await?;

    if description.status == TransformJobStatus::Completed {
        info!("Batch inference completed successfully");

        let output_key = format!("batch-output/test-{timestamp}.csv.out");
        let predictions = fetch_predictions(&output_key).await?;
        print_predictions(&TEST_ROWS, &predictions);
        info!(output = %output_key, "Full results available in the artifact store");

        Ok(())
    } else {
        log_failure(&description);
        anyhow::bail!(
            "Transform job {job_name} ended with status {}",
            description.status
        )
    }
}

/// Polls the describe closure at a fixed interval until a terminal status.
///
/// No backoff, no wall-clock timeout, no cancellation: the loop ends only
/// when a terminal description arrives or a describe call errors.
///
/// # Errors
///
/// Returns an error if a describe call fails.
pub async fn poll_until_terminal<F, Fut>(mut describe: F) -> Result<TransformJobDescription>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TransformJobDescription>>,
{
    let started = tokio::time::Instant::now();

    loop {
        let description = describe().await?;
        let elapsed = started.elapsed().as_secs();

        info!(
            status = %description.status,
            elapsed_seconds = elapsed,
            "Transform job status"
        );

        if description.status.is_terminal() {
            return Ok(description);
        }

        sleep(POLL_INTERVAL).await;
    }
}

/// Formats rows as the CSV payload the transform job consumes.
fn format_batch_csv(rows: &[[f32; 4]]) -> String {
    rows.iter()
        .map(|row| format_row(row))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_row(row: &[f32; 4]) -> String {
    row.map(|value| value.to_string()).join(",")
}

/// Downloads and parses the transform job output.
async fn fetch_predictions(output_key: &str) -> Result<Vec<usize>> {
    info!(output = output_key, "Downloading results");

    let get_result = OBJECT_STORE
        .get(&ObjectStorePath::from(output_key.to_string()))
        .await
        .context("Failed to read batch output")?;

    let data: Bytes = get_result
        .bytes()
        .await
        .context("Failed to read batch output bytes")?;

    let text = String::from_utf8(data.to_vec()).context("Batch output is not valid UTF-8")?;
    parse_predictions(&text)
}

/// Parses one predicted class per non-empty line.
fn parse_predictions(text: &str) -> Result<Vec<usize>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let value: f64 = line
                .parse()
                .with_context(|| format!("Invalid prediction line: {line}"))?;
            Ok(value as usize)
        })
        .collect()
}

/// Prints each input row with its predicted species.
fn print_predictions(rows: &[[f32; 4]], predictions: &[usize]) {
    for (index, (row, &class)) in rows.iter().zip(predictions).enumerate() {
        let species = SPECIES.get(class).copied().unwrap_or("unknown");
        info!(
            row = index + 1,
            input = %format_row(row),
            class,
            species,
            "Prediction"
        );
    }
}

/// Logs diagnostic fields for a job that did not complete.
fn log_failure(description: &TransformJobDescription) {
    error!(
        job_name = %description.job_name,
        status = %description.status,
        "Transform job did not complete"
    );

    if let Some(reason) = &description.failure_reason {
        error!(reason = %reason, "Failure reason");
    }

    error!(
        input = description.input_path.as_deref().unwrap_or("N/A"),
        output = description.output_path.as_deref().unwrap_or("N/A"),
        model = description.model_name.as_deref().unwrap_or("N/A"),
        instance_type = description.instance_type.as_deref().unwrap_or("N/A"),
        instance_count = description.instance_count.unwrap_or(0),
        "Transform job details"
    );

    if let (Some(started), Some(ended)) = (description.started_at, description.ended_at) {
        let duration = ended.signed_duration_since(started);
        error!(seconds = duration.num_seconds(), "Job duration");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn description(status: TransformJobStatus) -> TransformJobDescription {
        TransformJobDescription {
            job_name: String::from("iris-batch-test"),
            status,
            failure_reason: None,
            input_path: None,
            output_path: None,
            model_name: None,
            instance_type: None,
            instance_count: None,
            started_at: None,
            ended_at: None,
        }
    }

    #[test]
    fn test_format_batch_csv() {
        let csv = format_batch_csv(&TEST_ROWS);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), TEST_ROWS.len());
        assert_eq!(lines[0], "5.1,3.5,1.4,0.2");
        assert_eq!(lines[9], "7.7,2.8,6.7,2");
    }

    #[test]
    fn test_parse_predictions() {
        let predictions = parse_predictions("0\n1.0\n2\n\n").expect("parse");
        assert_eq!(predictions, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_predictions_rejects_garbage() {
        assert!(parse_predictions("0\nnot-a-class\n").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_for_terminal_status() {
        let calls = Cell::new(0usize);

        let result = poll_until_terminal(|| {
            let call = calls.get() + 1;
            calls.set(call);
            async move {
                let status = if call < 3 {
                    TransformJobStatus::InProgress
                } else {
                    TransformJobStatus::Completed
                };
                Ok(description(status))
            }
        })
        .await
        .expect("poll should succeed");

        assert_eq!(calls.get(), 3);
        assert_eq!(result.status, TransformJobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_stops_on_failed_and_stopped() {
        for terminal in [TransformJobStatus::Failed, TransformJobStatus::Stopped] {
            let calls = Cell::new(0usize);

            let result = poll_until_terminal(|| {
                calls.set(calls.get() + 1);
                async move { Ok(description(terminal)) }
            })
            .await
            .expect("poll should succeed");

            assert_eq!(calls.get(), 1, "terminal status should end polling");
            assert_eq!(result.status, terminal);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_propagates_describe_errors() {
        let result = poll_until_terminal(|| async { anyhow::bail!("connection reset") }).await;
        assert!(result.is_err());
    }
}
