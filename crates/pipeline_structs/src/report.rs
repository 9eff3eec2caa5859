//! Evaluation report schema.

use serde::{Deserialize, Serialize};

/// Report written by the evaluation step and attached to registered models.
///
/// The wire form is fixed:
/// `{"metrics": {"accuracy": {"value": ...}, "precision": {"value": ...},
/// "recall": {"value": ...}, "f1_score": {"value": ...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metrics: ReportMetrics,
}

/// The four fixed metrics of an evaluation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub accuracy: MetricValue,
    pub precision: MetricValue,
    pub recall: MetricValue,
    pub f1_score: MetricValue,
}

/// A single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
}

impl EvaluationReport {
    /// Creates a report from the four metric values.
    #[must_use]
    pub fn new(accuracy: f64, precision: f64, recall: f64, f1_score: f64) -> Self {
        Self {
            metrics: ReportMetrics {
                accuracy: MetricValue { value: accuracy },
                precision: MetricValue { value: precision },
                recall: MetricValue { value: recall },
                f1_score: MetricValue { value: f1_score },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_format() {
        let report = EvaluationReport::new(0.97, 0.96, 0.95, 0.955);
        let json = serde_json::to_value(&report).expect("serialize");

        assert_eq!(
            json,
            serde_json::json!({
                "metrics": {
                    "accuracy": {"value": 0.97},
                    "precision": {"value": 0.96},
                    "recall": {"value": 0.95},
                    "f1_score": {"value": 0.955},
                }
            })
        );
    }

    #[test]
    fn test_report_roundtrip() {
        let report = EvaluationReport::new(1.0, 1.0, 1.0, 1.0);
        let json = serde_json::to_string(&report).expect("serialize");
        let back: EvaluationReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, report);
    }
}
