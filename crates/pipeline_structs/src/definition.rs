//! Declarative pipeline definition submitted to the platform.
//!
//! The definition is inert data: building one has no side effect until it is
//! upserted through the platform client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ApprovalStatus;

/// Definition schema version accepted by the platform.
pub const DEFINITION_VERSION: &str = "1.0";

/// A complete pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Definition schema version
    pub version: String,

    /// Pipeline parameters, overridable per execution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    /// Steps, executed by the platform in declared dependency order
    pub steps: Vec<StepDefinition>,
}

/// A named pipeline parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, referenced from steps via [`PropertyValue::parameter`]
    pub name: String,

    #[serde(rename = "type")]
    pub parameter_type: ParameterType,

    /// Value used when an execution does not override the parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Parameter {
    /// Creates a string parameter with a default value.
    #[must_use]
    pub fn string(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_type: ParameterType::String,
            default_value: Some(default_value.into()),
        }
    }
}

/// Type of a pipeline parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    String,
}

/// A value in a step's arguments.
///
/// Either a literal string, a reference to another step's runtime property
/// (resolved by the platform once that step has run), or a reference to a
/// pipeline parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Literal(String),
    Get { get: String },
    Param { param: String },
}

impl PropertyValue {
    /// Creates a literal value.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a reference to a property of another step.
    ///
    /// Serializes as `{"get": "Steps.<step>.<path>"}`.
    #[must_use]
    pub fn step_property(step: &str, path: &str) -> Self {
        Self::Get {
            get: format!("Steps.{step}.{path}"),
        }
    }

    /// Creates a reference to a pipeline parameter.
    #[must_use]
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::Param { param: name.into() }
    }
}

/// Step result caching policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enable_caching: bool,

    /// Retention window, e.g. "30d"
    pub expire_after: String,
}

impl CacheConfig {
    /// Creates an enabled cache config with the given retention window.
    #[must_use]
    pub fn enabled(expire_after: impl Into<String>) -> Self {
        Self {
            enable_caching: true,
            expire_after: expire_after.into(),
        }
    }
}

/// A single pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepDefinition {
    Training(TrainingStep),
    Processing(ProcessingStep),
    RegisterModel(RegisterModelStep),
}

impl StepDefinition {
    /// Returns the step's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Training(step) => &step.name,
            Self::Processing(step) => &step.name,
            Self::RegisterModel(step) => &step.name,
        }
    }
}

/// A remote training step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStep {
    pub name: String,

    /// Container image running the training code
    pub image_uri: String,

    /// Execution role the platform assumes for this step
    pub role: String,

    pub instance_type: String,
    pub instance_count: u32,

    /// Environment variables passed into the container
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_config: Option<CacheConfig>,
}

/// A remote processing step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStep {
    pub name: String,

    pub image_uri: String,
    pub role: String,
    pub instance_type: String,
    pub instance_count: u32,

    /// Names of steps that must complete before this one starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Artifacts mounted into the processing container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ProcessingInput>,

    /// Artifacts collected from the processing container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ProcessingOutput>,

    /// Files within outputs whose contents later steps may reference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_files: Vec<PropertyFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_config: Option<CacheConfig>,
}

/// An artifact mounted into a processing container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingInput {
    pub source: PropertyValue,

    /// Mount path inside the container
    pub destination: String,
}

/// An artifact collected from a processing container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutput {
    pub output_name: String,

    /// Path inside the container the platform collects
    pub source: String,
}

/// A named file within a processing output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyFile {
    pub name: String,
    pub output_name: String,
    pub path: String,
}

/// A model-registration step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterModelStep {
    pub name: String,

    /// Inference container image registered with the model
    pub image_uri: String,

    /// Location of the trained model artifact
    pub model_data: PropertyValue,

    pub role: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    pub content_types: Vec<String>,
    pub response_types: Vec<String>,
    pub inference_instance_types: Vec<String>,
    pub transform_instance_types: Vec<String>,

    /// Model package group the version is registered into
    pub model_package_group: PropertyValue,

    pub approval_status: ApprovalStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_metrics: Option<ModelMetrics>,
}

/// Quality metrics attached to a registered model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub statistics: MetricsSource,
}

/// Location of a metrics document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSource {
    pub uri: PropertyValue,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_literal_serializes_as_string() {
        let value = PropertyValue::literal("text/csv");
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json, serde_json::json!("text/csv"));
    }

    #[test]
    fn test_property_value_step_reference() {
        let value = PropertyValue::step_property("TrainModel", "model_artifacts.uri");
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"get": "Steps.TrainModel.model_artifacts.uri"})
        );
    }

    #[test]
    fn test_property_value_parameter_reference() {
        let value = PropertyValue::parameter("ModelGroupName");
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json, serde_json::json!({"param": "ModelGroupName"}));
    }

    #[test]
    fn test_property_value_roundtrip() {
        let values = vec![
            PropertyValue::literal("plain"),
            PropertyValue::step_property("EvaluateModel", "outputs.evaluation.uri"),
            PropertyValue::parameter("ModelGroupName"),
        ];
        for value in values {
            let json = serde_json::to_string(&value).expect("serialize");
            let back: PropertyValue = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_step_definition_is_tagged_with_type() {
        let step = StepDefinition::Training(TrainingStep {
            name: String::from("TrainModel"),
            image_uri: String::from("registry.example.com/train:latest"),
            role: String::from("arn:aws:iam::123:role/exec"),
            instance_type: String::from("ml.m5.large"),
            instance_count: 1,
            environment: std::collections::BTreeMap::new(),
            cache_config: None,
        });

        let json = serde_json::to_value(&step).expect("serialize");
        assert_eq!(json["type"], "Training");
        assert_eq!(json["name"], "TrainModel");
        // Empty environment and absent cache config are omitted from the wire form
        assert!(json.get("environment").is_none());
        assert!(json.get("cache_config").is_none());
    }

    #[test]
    fn test_cache_config_enabled() {
        let cache = CacheConfig::enabled("30d");
        assert!(cache.enable_caching);
        assert_eq!(cache.expire_after, "30d");
    }

    #[test]
    fn test_parameter_with_default() {
        let parameter = Parameter::string("ModelGroupName", "iris-classifier-staging");
        let json = serde_json::to_value(&parameter).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "ModelGroupName",
                "type": "String",
                "default_value": "iris-classifier-staging",
            })
        );
    }
}
