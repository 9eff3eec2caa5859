//! Request and response types for the platform control-plane API.

use chrono::{DateTime, Utc};
use pipeline_structs::{
    ApprovalStatus, PipelineDefinition, PipelineExecutionStatus, TransformJobStatus,
};
use serde::{Deserialize, Serialize};

/// Body of a pipeline upsert request.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertPipelineRequest<'a> {
    /// Execution role the platform assumes when running the pipeline
    pub role_arn: &'a str,

    pub definition: &'a PipelineDefinition,
}

/// Response from `PUT /pipelines/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPipelineResponse {
    pub name: String,

    /// True when the upsert created the pipeline rather than updating it
    pub created: bool,
}

/// A pipeline execution record.
///
/// Returned from `POST /pipelines/{name}/executions` and
/// `GET /pipeline-executions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineExecution {
    pub id: String,
    pub status: PipelineExecutionStatus,
}

/// Response from `GET /model-packages`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPackageListResponse {
    pub summaries: Vec<ModelPackageSummary>,
}

/// Summary of a registered model package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPackageSummary {
    pub id: String,
    pub group_name: String,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

/// Full details of a registered model package.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPackageDetails {
    pub id: String,

    /// Registration status reported by the platform
    #[serde(default)]
    pub status: Option<String>,

    pub approval_status: ApprovalStatus,

    /// Inference containers registered with the package
    #[serde(default)]
    pub containers: Vec<InferenceContainer>,
}

/// An inference container attached to a model package.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceContainer {
    pub image: String,

    #[serde(default)]
    pub model_data_url: Option<String>,
}

/// Body of a transform-job creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransformJobRequest {
    pub job_name: String,
    pub model_package_id: String,
    pub input_path: String,
    pub output_path: String,
    pub content_type: String,
    pub accept: String,
    pub split_type: String,
    pub instance_type: String,
    pub instance_count: u32,
}

/// A transform job record from `GET /transform-jobs/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformJobDescription {
    pub job_name: String,
    pub status: TransformJobStatus,

    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub input_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub instance_count: Option<u32>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}
