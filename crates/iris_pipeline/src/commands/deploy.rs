//! Deploy command - builds the pipeline definition and upserts it.

use anyhow::Result;
use config::CONFIG;
use pipeline_structs::{build_pipeline, PipelineConfig};
use platform_client::PlatformClient;
use tracing::info;

/// Runs the deploy command.
///
/// Builds the three-step definition, upserts it to the platform and, when
/// requested via `--start` or `START_EXECUTION`, starts an execution.
///
/// # Errors
///
/// Returns an error if the upsert or the execution start fails.
pub async fn run(start: bool) -> Result<()> {
    info!("Creating pipeline definition");
    info!(region = %CONFIG.region, "Platform region");
    info!(role = %CONFIG.role_arn, "Execution role");
    info!(training_image = %CONFIG.training_image_uri, "Training image");
    info!(evaluation_image = %CONFIG.evaluation_image_uri, "Evaluation image");

    let pipeline_config = PipelineConfig::new(
        CONFIG.role_arn.clone(),
        CONFIG.training_image_uri.clone(),
        CONFIG.evaluation_image_uri.clone(),
    )
    .with_model_group_name(CONFIG.model_group_name.clone())
    .with_pipeline_name(CONFIG.pipeline_name.clone());

    let definition = build_pipeline(&pipeline_config);

    let client = PlatformClient::new()?;
    let response = client
        .upsert_pipeline(&CONFIG.pipeline_name, &CONFIG.role_arn, &definition)
        .await?;

    if response.created {
        info!(pipeline = %response.name, "Pipeline created");
    } else {
        info!(pipeline = %response.name, "Pipeline updated");
    }

    let start_requested = start || std::env::var("START_EXECUTION").is_ok();

    if start_requested {
        let execution = client
            .start_pipeline_execution(&CONFIG.pipeline_name)
            .await?;
        info!(execution_id = %execution.id, "Execution started");

        let current = client.describe_pipeline_execution(&execution.id).await?;
        info!(status = %current.status, "Execution status");
        info!(
            "View executions at {}/pipelines/{}/executions",
            CONFIG.platform_endpoint.trim_end_matches('/'),
            CONFIG.pipeline_name
        );
    } else {
        info!("Pipeline deployed but not started");
        info!("To start an execution: pass --start, or set START_EXECUTION=1");
    }

    Ok(())
}
