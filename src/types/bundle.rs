// src/types/bundle.rs
//! Request and outcome shapes exposed by the controller

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PipelineError, Stage, UnverifiableClaim};
use crate::latex::SanityCheck;
use crate::types::job_intel::JobIntel;
use crate::types::resume::RequirementEvidence;
use crate::types::score::ScoreReport;

// ===== Request =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_url: Option<String>,
    pub raw_jd_text: Option<String>,
    pub base_resume_path: Option<PathBuf>,
    /// Caller-assigned; derived from the job text when absent.
    pub job_id: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub date_applied: Option<NaiveDate>,
    pub notes: Option<String>,
}

// ===== Output Bundle =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBundle {
    pub job_intel_json: JobIntel,
    pub updated_resume_path: PathBuf,
    pub updated_resume_latex: String,
    pub cover_letter: String,
    pub evidence_mapping: Vec<RequirementEvidence>,
    pub score_report: ScoreReport,
    pub application_tracker_csv: String,
    /// Structural problems already present in the base resume.
    pub risk_flags: Vec<String>,
    pub compile_sanity_checks: Vec<SanityCheck>,
    pub warnings: Vec<UnverifiableClaim>,
}

// ===== Outcome =====

/// Terminal result of a pipeline run. A partial bundle is never returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Done(Box<OutputBundle>),
    WaitingForInput {
        missing_fields: Vec<String>,
        message: String,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

impl PipelineOutcome {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineOutcome::Done(_) => Stage::Done,
            PipelineOutcome::WaitingForInput { .. } => Stage::WaitingForInput,
            PipelineOutcome::Failed { .. } => Stage::Failed,
        }
    }

    pub fn bundle(&self) -> Option<&OutputBundle> {
        match self {
            PipelineOutcome::Done(bundle) => Some(bundle.as_ref()),
            _ => None,
        }
    }
}

impl From<PipelineError> for PipelineOutcome {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingInput { fields } => {
                let message = missing_input_message(&fields);
                PipelineOutcome::WaitingForInput {
                    missing_fields: fields,
                    message,
                }
            }
            other => PipelineOutcome::Failed {
                stage: other.failed_stage(),
                error: other.to_string(),
            },
        }
    }
}

fn missing_input_message(fields: &[String]) -> String {
    let needs_job = fields.iter().any(|f| f == "job_url" || f == "raw_jd_text");
    let needs_resume = fields.iter().any(|f| f == "base_resume_path");
    match (needs_job, needs_resume) {
        (true, true) => "Please provide a job URL or paste the job description text, and the file path to your base LaTeX resume (e.g., ./resume.tex).".to_string(),
        (true, false) => "Please provide a job URL or paste the job description text.".to_string(),
        (false, true) => "Please provide the file path to your base LaTeX resume (e.g., ./resume.tex).".to_string(),
        (false, false) => format!("Missing input: {}", fields.join(", ")),
    }
}
