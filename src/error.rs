// src/error.rs
//! Pipeline stage identifiers and the errors that halt a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of a run in the linear pipeline.
///
/// Transitions are strictly sequential: `Validating -> Extracting -> Tailoring
/// -> Drafting -> Scoring -> Tracking -> Done`. `WaitingForInput` and `Failed`
/// are the other two terminal positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Extracting,
    Tailoring,
    Drafting,
    Scoring,
    Tracking,
    Done,
    WaitingForInput,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Extracting => "extracting",
            Stage::Tailoring => "tailoring",
            Stage::Drafting => "drafting",
            Stage::Scoring => "scoring",
            Stage::Tracking => "tracking",
            Stage::Done => "done",
            Stage::WaitingForInput => "waiting_for_input",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required field that a stage output is missing or carries an invalid value for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that halt a pipeline run. None of them is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required request fields are absent; the caller is asked for them.
    #[error("missing required input: {}", fields.join(", "))]
    MissingInput { fields: Vec<String> },

    /// The job URL could not be fetched or did not yield a job description.
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// A stage produced output that failed its boundary checks.
    #[error("{stage} output failed validation on `{field}`: {reason}")]
    Validation {
        stage: Stage,
        field: String,
        reason: String,
    },

    /// A collaborator (file system, ledger) failed while a stage was running.
    #[error("{stage} failed: {source:#}")]
    Stage {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn validation(stage: Stage, issue: FieldIssue) -> Self {
        PipelineError::Validation {
            stage,
            field: issue.field,
            reason: issue.reason,
        }
    }

    pub fn stage(stage: Stage, source: anyhow::Error) -> Self {
        PipelineError::Stage { stage, source }
    }

    /// Stage the error is attributed to.
    pub fn failed_stage(&self) -> Stage {
        match self {
            PipelineError::MissingInput { .. } => Stage::Validating,
            PipelineError::Fetch { .. } => Stage::Extracting,
            PipelineError::Validation { stage, .. } | PipelineError::Stage { stage, .. } => *stage,
        }
    }
}

/// Non-fatal: an item the job asks for that the resume cannot back up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnverifiableClaim {
    pub stage: Stage,
    pub item: String,
    pub reason: String,
}
