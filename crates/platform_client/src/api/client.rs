//! Rate-limited HTTP client for the platform control-plane API.

use core::num::NonZeroU32;
use core::time::Duration;

use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use config::CONFIG;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use pipeline_structs::PipelineDefinition;
use reqwest::Client;
use tracing::{info, warn};

use super::models::{
    CreateTransformJobRequest, ModelPackageDetails, ModelPackageListResponse, ModelPackageSummary,
    PipelineExecution, TransformJobDescription, UpsertPipelineRequest, UpsertPipelineResponse,
};

/// Rate limit: 5 requests per second against the control plane
const RATE_LIMIT_PER_SECOND: u32 = 5;

type RateLimiterType = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate-limited client for the platform control-plane API.
pub struct PlatformClient {
    client: Client,
    base_url: String,
    per_second_limiter: RateLimiterType,
}

impl PlatformClient {
    /// Creates a new client with rate limiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let per_second_quota = Quota::per_second(
            NonZeroU32::new(RATE_LIMIT_PER_SECOND).expect("rate limit should be non-zero"),
        );
        let per_second_limiter = RateLimiter::direct(per_second_quota);

        Ok(Self {
            client,
            base_url: CONFIG.platform_endpoint.trim_end_matches('/').to_string(),
            per_second_limiter,
        })
    }

    /// Waits for the rate limiter before making a request.
    async fn wait_for_rate_limit(&self) {
        self.per_second_limiter.until_ready().await;
    }

    /// Creates the pipeline or updates it in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn upsert_pipeline(
        &self,
        name: &str,
        role_arn: &str,
        definition: &PipelineDefinition,
    ) -> Result<UpsertPipelineResponse> {
        self.wait_for_rate_limit().await;

        info!(pipeline = name, "Upserting pipeline");

        let url = format!("{}/pipelines/{name}", self.base_url);

        let response = self
            .client
            .put(&url)
            .header("Authorization", &CONFIG.platform_api_token)
            .json(&UpsertPipelineRequest {
                role_arn,
                definition,
            })
            .send()
            .await
            .context("Failed to send pipeline upsert request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Pipeline upsert failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse pipeline upsert response")
    }

    /// Starts an execution of the named pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn start_pipeline_execution(&self, name: &str) -> Result<PipelineExecution> {
        self.wait_for_rate_limit().await;

        info!(pipeline = name, "Starting pipeline execution");

        let url = format!("{}/pipelines/{name}/executions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", &CONFIG.platform_api_token)
            .send()
            .await
            .context("Failed to send pipeline execution request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Pipeline execution start failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse pipeline execution response")
    }

    /// Fetches the current state of a pipeline execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn describe_pipeline_execution(&self, id: &str) -> Result<PipelineExecution> {
        self.wait_for_rate_limit().await;

        let url = format!("{}/pipeline-executions/{id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &CONFIG.platform_api_token)
            .send()
            .await
            .context("Failed to send pipeline execution describe request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Pipeline execution describe failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse pipeline execution response")
    }

    /// Returns the most recently created approved model package in the group,
    /// if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn latest_approved_model_package(
        &self,
        group_name: &str,
    ) -> Result<Option<ModelPackageSummary>> {
        self.wait_for_rate_limit().await;

        info!(group = group_name, "Listing approved model packages");

        let url = format!(
            "{}/model-packages?group_name={group_name}&approval_status=Approved&sort_by=creation_time&sort_order=descending&max_results=1",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", &CONFIG.platform_api_token)
            .send()
            .await
            .context("Failed to send model package list request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Model package list failed with status {status}: {body}");
        }

        let data: ModelPackageListResponse = response
            .json()
            .await
            .context("Failed to parse model package list response")?;

        Ok(data.summaries.into_iter().next())
    }

    /// Fetches the full details of a model package.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn describe_model_package(&self, id: &str) -> Result<ModelPackageDetails> {
        self.wait_for_rate_limit().await;

        let url = format!("{}/model-packages/{id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &CONFIG.platform_api_token)
            .send()
            .await
            .context("Failed to send model package describe request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Model package describe failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse model package response")
    }

    /// Submits a batch-transform job.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn create_transform_job(
        &self,
        request: &CreateTransformJobRequest,
    ) -> Result<TransformJobDescription> {
        self.wait_for_rate_limit().await;

        info!(job_name = %request.job_name, "Creating transform job");

        let url = format!("{}/transform-jobs", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", &CONFIG.platform_api_token)
            .json(request)
            .send()
            .await
            .context("Failed to send transform job request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Transform job creation failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse transform job response")
    }

    /// Fetches the current state of a transform job, retrying on 429.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries.
    pub async fn describe_transform_job(
        &self,
        job_name: &str,
    ) -> Result<TransformJobDescription> {
        let client = &self.client;
        let url = format!("{}/transform-jobs/{job_name}", self.base_url);

        (|| async {
            self.wait_for_rate_limit().await;

            let response = client
                .get(&url)
                .header("Authorization", &CONFIG.platform_api_token)
                .send()
                .await
                .context("Failed to send transform job describe request")?;

            let status = response.status();

            // Only retry on 429 Too Many Requests
            if status == 429 {
                let body = response.text().await.unwrap_or_default();
                warn!(job_name, "Rate limited (429), will retry");
                anyhow::bail!("Rate limited (429): {body}");
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Transform job describe failed with status {status}: {body}");
            }

            response
                .json()
                .await
                .context("Failed to parse transform job response")
        })
        .retry(
            &ExponentialBuilder::default()
                .with_max_times(3)
                .with_min_delay(Duration::from_secs(1))
                .with_max_delay(Duration::from_secs(8)),
        )
        .await
    }
}
