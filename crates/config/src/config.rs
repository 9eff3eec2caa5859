use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use anyhow::Context;
use object_store::ObjectStore;
use object_store::local::LocalFileSystem;

/// Returns the base path for the artifact object store.
#[must_use]
pub fn get_base_path() -> PathBuf {
    dotenvy::dotenv().ok();

    #[cfg(target_os = "linux")]
    let base_path_unwrap = PathBuf::from("/workspace/artifacts");

    #[cfg(not(target_os = "linux"))]
    let base_path_unwrap = std::env::temp_dir().join("iris-pipeline-artifacts");

    std::env::var("ARTIFACT_BASE_PATH").map_or_else(|_| base_path_unwrap, PathBuf::from)
}

/// Global artifact store instance, lazily initialized.
///
/// Holds batch-transform inputs and outputs under the `batch-input/` and
/// `batch-output/` prefixes.
pub static OBJECT_STORE: LazyLock<Arc<dyn ObjectStore>> = LazyLock::new(|| {
    let base_path = get_base_path();

    std::fs::create_dir_all(&base_path).expect("Failed to create artifact store directory");

    Arc::new(LocalFileSystem::new_with_prefix(&base_path).expect("Failed to create artifact store"))
});

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::from_env().expect("Failed to create config"));

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the platform control-plane API
    pub platform_endpoint: String,

    /// API token sent as the Authorization header
    pub platform_api_token: String,

    /// Platform region
    pub region: String,

    /// Execution role ARN the platform assumes for pipeline steps
    pub role_arn: String,

    /// Container image URI for the training step
    pub training_image_uri: String,

    /// Container image URI for the evaluation step
    pub evaluation_image_uri: String,

    /// Model package group the pipeline registers into
    pub model_group_name: String,

    /// Name of the deployed pipeline
    pub pipeline_name: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `PLATFORM_ENDPOINT`: base URL of the platform control-plane API
    /// - `PLATFORM_API_TOKEN`: API token for the platform
    /// - `PLATFORM_ROLE_ARN`: execution role ARN
    /// - `TRAINING_IMAGE_URI`: training container image
    /// - `EVALUATION_IMAGE_URI`: evaluation container image
    ///
    /// Optional environment variables:
    /// - `PLATFORM_REGION`: platform region (default: `eu-north-1`)
    /// - `MODEL_GROUP_NAME`: model package group (default: `iris-classifier-staging`)
    /// - `PIPELINE_NAME`: pipeline name (default: `IrisPipeline`)
    /// - `ARTIFACT_BASE_PATH`: base directory for the artifact store
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        let platform_endpoint = std::env::var("PLATFORM_ENDPOINT")
            .context("PLATFORM_ENDPOINT environment variable not set")?;

        let platform_api_token = std::env::var("PLATFORM_API_TOKEN")
            .context("PLATFORM_API_TOKEN environment variable not set")?;

        let region =
            std::env::var("PLATFORM_REGION").unwrap_or_else(|_| String::from("eu-north-1"));

        let role_arn = std::env::var("PLATFORM_ROLE_ARN")
            .context("PLATFORM_ROLE_ARN environment variable not set")?;

        let training_image_uri = std::env::var("TRAINING_IMAGE_URI")
            .context("TRAINING_IMAGE_URI environment variable not set")?;

        let evaluation_image_uri = std::env::var("EVALUATION_IMAGE_URI")
            .context("EVALUATION_IMAGE_URI environment variable not set")?;

        let model_group_name = std::env::var("MODEL_GROUP_NAME")
            .unwrap_or_else(|_| String::from("iris-classifier-staging"));

        let pipeline_name =
            std::env::var("PIPELINE_NAME").unwrap_or_else(|_| String::from("IrisPipeline"));

        Ok(Self {
            platform_endpoint,
            platform_api_token,
            region,
            role_arn,
            training_image_uri,
            evaluation_image_uri,
            model_group_name,
            pipeline_name,
        })
    }
}
