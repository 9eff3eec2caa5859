//! Assembles the three-step iris classifier pipeline definition.
//!
//! Train, evaluate, conditionally register. Building the definition has no
//! side effect; deployment happens when the definition is upserted.

use std::collections::BTreeMap;

use crate::definition::{
    CacheConfig, MetricsSource, ModelMetrics, Parameter, PipelineDefinition, ProcessingInput,
    ProcessingOutput, ProcessingStep, PropertyFile, PropertyValue, RegisterModelStep,
    StepDefinition, TrainingStep, DEFINITION_VERSION,
};
use crate::ApprovalStatus;

/// Step names as they appear in the deployed pipeline.
pub const TRAINING_STEP_NAME: &str = "TrainModel";
pub const EVALUATION_STEP_NAME: &str = "EvaluateModel";
pub const REGISTER_STEP_NAME: &str = "RegisterModel";

/// Pipeline parameter holding the target model package group.
pub const MODEL_GROUP_PARAMETER: &str = "ModelGroupName";

/// Output name under which the evaluation step publishes its report.
pub const EVALUATION_OUTPUT_NAME: &str = "evaluation";

const TRAINING_INSTANCE_TYPE: &str = "ml.m5.large";
const EVALUATION_INSTANCE_TYPE: &str = "ml.t3.medium";
const INFERENCE_INSTANCE_TYPE: &str = "ml.t2.medium";
const TRANSFORM_INSTANCE_TYPE: &str = "ml.c6i.large";

const CACHE_EXPIRE_AFTER: &str = "30d";

/// Mount path of the trained model inside the evaluation container.
const MODEL_CHANNEL_DESTINATION: &str = "/opt/ml/processing/model";

/// Path inside the evaluation container the report is collected from.
const EVALUATION_OUTPUT_SOURCE: &str = "/opt/ml/processing/output";

/// Configuration for building the iris pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Execution role the platform assumes for every step.
    pub role: String,
    /// Container image for the training step (also registered for inference).
    pub training_image_uri: String,
    /// Container image for the evaluation step.
    pub evaluation_image_uri: String,
    /// Default model package group for registration.
    pub model_group_name: String,
    /// Pipeline name.
    pub pipeline_name: String,
}

impl PipelineConfig {
    /// Creates a config with the default group and pipeline names.
    #[must_use]
    pub fn new(
        role: impl Into<String>,
        training_image_uri: impl Into<String>,
        evaluation_image_uri: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            training_image_uri: training_image_uri.into(),
            evaluation_image_uri: evaluation_image_uri.into(),
            model_group_name: String::from("iris-classifier-staging"),
            pipeline_name: String::from("IrisPipeline"),
        }
    }

    /// Sets the default model package group.
    #[must_use]
    pub fn with_model_group_name(mut self, name: impl Into<String>) -> Self {
        self.model_group_name = name.into();
        self
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }
}

/// Builds the iris classifier pipeline definition.
///
/// Three steps: train the model, evaluate it against the canned dataset, and
/// register the artifact pending manual approval, with the evaluation report
/// attached as model metrics.
#[must_use]
pub fn build_pipeline(config: &PipelineConfig) -> PipelineDefinition {
    let cache_config = CacheConfig::enabled(CACHE_EXPIRE_AFTER);

    let model_group_parameter =
        Parameter::string(MODEL_GROUP_PARAMETER, config.model_group_name.clone());

    let mut training_environment = BTreeMap::new();
    training_environment.insert(
        String::from("TRAINING_IMAGE"),
        config.training_image_uri.clone(),
    );

    let training_step = TrainingStep {
        name: String::from(TRAINING_STEP_NAME),
        image_uri: config.training_image_uri.clone(),
        role: config.role.clone(),
        instance_type: String::from(TRAINING_INSTANCE_TYPE),
        instance_count: 1,
        environment: training_environment,
        cache_config: Some(cache_config.clone()),
    };

    let evaluation_step = ProcessingStep {
        name: String::from(EVALUATION_STEP_NAME),
        image_uri: config.evaluation_image_uri.clone(),
        role: config.role.clone(),
        instance_type: String::from(EVALUATION_INSTANCE_TYPE),
        instance_count: 1,
        depends_on: vec![String::from(TRAINING_STEP_NAME)],
        inputs: vec![ProcessingInput {
            source: PropertyValue::step_property(TRAINING_STEP_NAME, "model_artifacts.uri"),
            destination: String::from(MODEL_CHANNEL_DESTINATION),
        }],
        outputs: vec![ProcessingOutput {
            output_name: String::from(EVALUATION_OUTPUT_NAME),
            source: String::from(EVALUATION_OUTPUT_SOURCE),
        }],
        property_files: vec![PropertyFile {
            name: String::from("EvaluationReport"),
            output_name: String::from(EVALUATION_OUTPUT_NAME),
            path: String::from("evaluation.json"),
        }],
        cache_config: Some(cache_config),
    };

    let register_step = RegisterModelStep {
        name: String::from(REGISTER_STEP_NAME),
        image_uri: config.training_image_uri.clone(),
        model_data: PropertyValue::step_property(TRAINING_STEP_NAME, "model_artifacts.uri"),
        role: config.role.clone(),
        depends_on: vec![String::from(EVALUATION_STEP_NAME)],
        content_types: vec![String::from("text/csv")],
        response_types: vec![String::from("text/csv")],
        inference_instance_types: vec![String::from(INFERENCE_INSTANCE_TYPE)],
        transform_instance_types: vec![String::from(TRANSFORM_INSTANCE_TYPE)],
        model_package_group: PropertyValue::parameter(MODEL_GROUP_PARAMETER),
        approval_status: ApprovalStatus::PendingManualApproval,
        model_metrics: Some(ModelMetrics {
            statistics: MetricsSource {
                uri: PropertyValue::step_property(
                    EVALUATION_STEP_NAME,
                    "outputs.evaluation.uri",
                ),
                content_type: String::from("application/json"),
            },
        }),
    };

    PipelineDefinition {
        version: String::from(DEFINITION_VERSION),
        parameters: vec![model_group_parameter],
        steps: vec![
            StepDefinition::Training(training_step),
            StepDefinition::Processing(evaluation_step),
            StepDefinition::RegisterModel(register_step),
        ],
    }
}
