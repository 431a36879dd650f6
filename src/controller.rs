// src/controller.rs
//! Pipeline controller.
//!
//! Runs validating -> extracting -> tailoring -> drafting -> scoring ->
//! tracking strictly in order. Every stage output is validated before the
//! next stage starts; the first failure halts the run and no partial bundle
//! is returned.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::digest::short_digest;
use crate::core::fs_ops::ArtifactStore;
use crate::core::ledger::TrackerLedger;
use crate::cover_letter::{draft_cover_letter, COVER_LETTER_FILE};
use crate::error::{PipelineError, Stage, UnverifiableClaim};
use crate::job_intel::{extract_job_intel, ExtractionContext, JobPosting, JobScraper, PageFetcher};
use crate::scoring::score_resumes;
use crate::tailor::tailor_resume;
use crate::tracker::{build_row, record_application, ApplicationMeta};
use crate::types::bundle::{JobRequest, OutputBundle, PipelineOutcome};
use crate::types::resume::TailoredResume;
use crate::types::resume::ResumeDocument;
use crate::utils::{non_blank, resolve_path};

pub const METRICS_FILE: &str = "metrics.json";
const JOB_ID_LEN: usize = 12;

type StageResult<T> = std::result::Result<T, PipelineError>;

pub struct Controller {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn ArtifactStore>,
    output_root: PathBuf,
    overwrite: bool,
}

/// Request fields after blank values are dropped and the input rules hold.
struct ValidatedRequest {
    source: JobSourceInput,
    base_resume_path: PathBuf,
    job_id: Option<String>,
    company: Option<String>,
    location: Option<String>,
    meta: ApplicationMeta,
}

enum JobSourceInput {
    Url(String),
    Text(String),
}

impl Controller {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn ArtifactStore>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            store,
            output_root: output_root.into(),
            overwrite: false,
        }
    }

    /// Replace existing files in a job folder instead of failing.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run the whole pipeline for one request. Always returns a terminal
    /// outcome: `done`, `waiting_for_input` or `failed`.
    pub async fn run(&self, request: JobRequest, ledger: &mut TrackerLedger) -> PipelineOutcome {
        match self.execute(request, ledger).await {
            Ok(bundle) => {
                info!(
                    "Pipeline done for {} ({} warnings)",
                    bundle.job_intel_json.job_id,
                    bundle.warnings.len()
                );
                PipelineOutcome::Done(Box::new(bundle))
            }
            Err(PipelineError::MissingInput { fields }) => {
                warn!("Waiting for input: {}", fields.join(", "));
                PipelineError::MissingInput { fields }.into()
            }
            Err(err) => {
                error!("Pipeline failed at {}: {}", err.failed_stage(), err);
                err.into()
            }
        }
    }

    async fn execute(
        &self,
        request: JobRequest,
        ledger: &mut TrackerLedger,
    ) -> StageResult<OutputBundle> {
        // ===== Validating =====
        info!("Stage: {}", Stage::Validating);
        let request = validate_request(request)?;
        let base = self.load_base_resume(&request.base_resume_path).await?;

        // ===== Extracting =====
        info!("Stage: {}", Stage::Extracting);
        let (posting, job_url) = match &request.source {
            JobSourceInput::Url(url) => (self.fetch_posting(url).await?, Some(url.as_str())),
            JobSourceInput::Text(text) => (JobPosting::from_text(text), None),
        };
        let job_id = request
            .job_id
            .clone()
            .unwrap_or_else(|| short_digest(posting.full_text().as_bytes(), JOB_ID_LEN));

        let intel = extract_job_intel(
            &posting,
            &ExtractionContext {
                job_id: &job_id,
                job_url,
                company: request.company.as_deref(),
                location: request.location.as_deref(),
            },
        );
        intel
            .validate()
            .map_err(|issue| PipelineError::validation(Stage::Extracting, issue))?;
        info!(
            "Extracted job {}: {} ({} must-have, {} keywords)",
            intel.job_id,
            intel.role.title,
            intel.requirements.must_have.len(),
            intel.keywords_for_ats.len()
        );

        let mut warnings = Vec::new();

        // ===== Tailoring =====
        info!("Stage: {}", Stage::Tailoring);
        let output_root = resolve_path(&self.output_root);
        let tailored = tailor_resume(&base, &intel, &output_root);
        tailored
            .validate(&base.path, &output_root)
            .map_err(|issue| PipelineError::validation(Stage::Tailoring, issue))?;
        for flag in &tailored.risk_flags {
            warn!("Resume risk for {}: {}", intel.job_id, flag);
        }
        self.store
            .create_dir(&tailored.job_folder)
            .await
            .map_err(|e| PipelineError::stage(Stage::Tailoring, e))?;
        self.store
            .write_text(&tailored.document.path, &tailored.document.content, self.overwrite)
            .await
            .map_err(|e| PipelineError::stage(Stage::Tailoring, e))?;
        warnings.extend(tailored.missing_unverifiable.iter().map(|item| UnverifiableClaim {
            stage: Stage::Tailoring,
            item: item.clone(),
            reason: "not found in the base resume".to_string(),
        }));

        // ===== Drafting =====
        info!("Stage: {}", Stage::Drafting);
        let letter = draft_cover_letter(&tailored.document.content, &intel);
        letter
            .validate(&tailored.document.content, &intel.requirements.must_have)
            .map_err(|issue| PipelineError::validation(Stage::Drafting, issue))?;
        let letter_path = tailored.job_folder.join(COVER_LETTER_FILE);
        self.store
            .write_text(&letter_path, &letter.letter, self.overwrite)
            .await
            .map_err(|e| PipelineError::stage(Stage::Drafting, e))?;
        warnings.extend(letter.unverifiable().map(|requirement| UnverifiableClaim {
            stage: Stage::Drafting,
            item: requirement.to_string(),
            reason: "no verbatim evidence in the resume; left out of the letter".to_string(),
        }));

        // ===== Scoring =====
        info!("Stage: {}", Stage::Scoring);
        let score_report = score_resumes(&base, &tailored.document, &intel);
        score_report
            .validate()
            .map_err(|issue| PipelineError::validation(Stage::Scoring, issue))?;
        self.verify_written(&tailored, &score_report.resume_tailored_hash).await?;
        let metrics = serde_json::to_string_pretty(&score_report)
            .context("Failed to serialize score report")
            .map_err(|e| PipelineError::stage(Stage::Scoring, e))?;
        self.store
            .write_text(&tailored.job_folder.join(METRICS_FILE), &metrics, self.overwrite)
            .await
            .map_err(|e| PipelineError::stage(Stage::Scoring, e))?;
        info!(
            "Keyword coverage {:.2}, must-have coverage {:.2}, {} changed lines",
            score_report.keyword_coverage, score_report.must_have_coverage, score_report.diff_size
        );

        // ===== Tracking =====
        info!("Stage: {}", Stage::Tracking);
        let row = build_row(&intel, &tailored.document.path, &letter_path, &request.meta);
        row.validate()
            .map_err(|issue| PipelineError::validation(Stage::Tracking, issue))?;
        let application_tracker_csv = record_application(ledger, &row)
            .map_err(|e| PipelineError::stage(Stage::Tracking, e))?;

        Ok(OutputBundle {
            job_intel_json: intel,
            updated_resume_path: tailored.document.path,
            updated_resume_latex: tailored.document.content,
            cover_letter: letter.letter,
            evidence_mapping: letter.mapping,
            score_report,
            application_tracker_csv,
            risk_flags: tailored.risk_flags,
            compile_sanity_checks: tailored.compile_sanity_checks,
            warnings,
        })
    }

    /// The tailored resume on disk must be the text that was scored.
    async fn verify_written(&self, tailored: &TailoredResume, scored_hash: &str) -> StageResult<()> {
        let on_disk = self
            .store
            .sha256(&tailored.document.path)
            .await
            .map_err(|e| PipelineError::stage(Stage::Scoring, e))?;
        if on_disk != scored_hash {
            return Err(PipelineError::Validation {
                stage: Stage::Scoring,
                field: "resume_tailored_hash".to_string(),
                reason: format!(
                    "{} on disk hashes to {}, scored text to {}",
                    tailored.document.path.display(),
                    on_disk,
                    scored_hash
                ),
            });
        }
        Ok(())
    }

    async fn load_base_resume(&self, path: &Path) -> StageResult<ResumeDocument> {
        let content = self
            .store
            .read_text(path)
            .await
            .map_err(|e| PipelineError::stage(Stage::Validating, e))?;
        if content.trim().is_empty() {
            return Err(PipelineError::Validation {
                stage: Stage::Validating,
                field: "base_resume_path".to_string(),
                reason: format!("{} is empty", path.display()),
            });
        }
        info!("Loaded base resume {} ({} bytes)", path.display(), content.len());
        Ok(ResumeDocument::new(path.to_path_buf(), content))
    }

    async fn fetch_posting(&self, url: &str) -> StageResult<JobPosting> {
        let html = self
            .fetcher
            .fetch_html(url)
            .await
            .map_err(|e| PipelineError::Fetch {
                url: url.to_string(),
                message: format!("{:#}", e),
            })?;

        JobScraper::parse_posting(&html).ok_or_else(|| PipelineError::Fetch {
            url: url.to_string(),
            message: "page contains no job description".to_string(),
        })
    }
}

fn validate_request(request: JobRequest) -> StageResult<ValidatedRequest> {
    let job_url = non_blank(request.job_url);
    let raw_jd_text = non_blank(request.raw_jd_text);
    let base_resume_path = request
        .base_resume_path
        .filter(|p| !p.to_string_lossy().trim().is_empty());

    let mut missing = Vec::new();
    if job_url.is_none() && raw_jd_text.is_none() {
        missing.push("job_url".to_string());
        missing.push("raw_jd_text".to_string());
    }
    if base_resume_path.is_none() {
        missing.push("base_resume_path".to_string());
    }

    let source = match (job_url, raw_jd_text, base_resume_path) {
        (Some(_), Some(_), Some(_)) => {
            return Err(PipelineError::Validation {
                stage: Stage::Validating,
                field: "job_url".to_string(),
                reason: "provide either job_url or raw_jd_text, not both".to_string(),
            })
        }
        (Some(url), None, Some(path)) => (JobSourceInput::Url(url), path),
        (None, Some(text), Some(path)) => (JobSourceInput::Text(text), path),
        _ => return Err(PipelineError::MissingInput { fields: missing }),
    };

    let job_id = non_blank(request.job_id);
    if let Some(id) = &job_id {
        if id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
            return Err(PipelineError::Validation {
                stage: Stage::Validating,
                field: "job_id".to_string(),
                reason: format!("`{}` must not contain path separators or `..`", id),
            });
        }
    }

    Ok(ValidatedRequest {
        source: source.0,
        base_resume_path: resolve_path(&source.1),
        job_id,
        company: non_blank(request.company),
        location: non_blank(request.location),
        meta: ApplicationMeta {
            date_applied: request.date_applied,
            notes: non_blank(request.notes),
        },
    })
}
