//! Status enums for platform-managed records.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Status of a batch-transform job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TransformJobStatus {
    InProgress,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

impl TransformJobStatus {
    /// Returns true if the job has reached a terminal state.
    ///
    /// Exactly `Completed`, `Failed` and `Stopped` are terminal; polling
    /// continues on any other status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

/// Status of a pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum PipelineExecutionStatus {
    Executing,
    Stopping,
    Completed,
    Failed,
    Stopped,
}

impl PipelineExecutionStatus {
    /// Returns true if the execution has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

/// Approval status of a registered model package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ApprovalStatus {
    PendingManualApproval,
    Approved,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_job_terminal_states() {
        assert!(TransformJobStatus::Completed.is_terminal());
        assert!(TransformJobStatus::Failed.is_terminal());
        assert!(TransformJobStatus::Stopped.is_terminal());
        assert!(!TransformJobStatus::InProgress.is_terminal());
        assert!(!TransformJobStatus::Stopping.is_terminal());
    }

    #[test]
    fn test_pipeline_execution_terminal_states() {
        assert!(PipelineExecutionStatus::Completed.is_terminal());
        assert!(PipelineExecutionStatus::Failed.is_terminal());
        assert!(PipelineExecutionStatus::Stopped.is_terminal());
        assert!(!PipelineExecutionStatus::Executing.is_terminal());
        assert!(!PipelineExecutionStatus::Stopping.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        let status: TransformJobStatus =
            serde_json::from_str("\"Completed\"").expect("deserialize");
        assert_eq!(status, TransformJobStatus::Completed);

        let json = serde_json::to_string(&ApprovalStatus::PendingManualApproval)
            .expect("serialize");
        assert_eq!(json, "\"PendingManualApproval\"");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TransformJobStatus::InProgress.to_string(), "InProgress");
        assert_eq!(ApprovalStatus::Approved.to_string(), "Approved");
    }
}
