// tests/pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use jobhunt_pipeline::core::{ArtifactStore, FsOps, TrackerLedger};
use jobhunt_pipeline::job_intel::PageFetcher;
use jobhunt_pipeline::types::tracker::TRACKER_HEADER;
use jobhunt_pipeline::types::Evidence;
use jobhunt_pipeline::{Controller, JobRequest, PipelineOutcome, Stage};

const JOB_TEXT: &str = "Data Engineer
Acme Analytics is hiring in Berlin.
Requirements:
- Python
- SQL
Nice to have:
- Go
Hybrid, full-time.
";

const RESUME: &str = "\\documentclass{article}
\\begin{document}
\\section{Experience}
\\item Built ETL jobs in Python at Initech \\\\
\\section{Skills}
Languages: Java, SQL, Python
\\end{document}
";

const JOB_PAGE: &str = r#"
<html><body>
  <h1>Senior Rust Engineer</h1>
  <div class="company-name">Acme Robotics</div>
  <div class="job-description">
    <h2>Requirements</h2>
    <ul><li>5+ years Rust</li><li>PostgreSQL</li></ul>
    <h2>Nice to have</h2>
    <ul><li>Kubernetes</li></ul>
  </div>
</body></html>
"#;

// ===== Collaborator stubs =====

struct StubFetcher {
    page: Result<String, String>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn serving(html: &str) -> Self {
        Self {
            page: Ok(html.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            page: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_html(&self, _url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.page.clone().map_err(|message| anyhow!(message))
    }
}

#[derive(Default)]
struct CountingStore {
    calls: AtomicUsize,
}

#[async_trait]
impl ArtifactStore for CountingStore {
    async fn read_text(&self, path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FsOps.read_text(path).await
    }

    async fn write_text(&self, path: &Path, content: &str, overwrite: bool) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FsOps.write_text(path, content, overwrite).await
    }

    async fn create_dir(&self, path: &Path) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FsOps.create_dir(path).await
    }

    async fn sha256(&self, path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FsOps.sha256(path).await
    }
}

// ===== Fixture =====

struct Fixture {
    dir: TempDir,
    fetcher: Arc<StubFetcher>,
    store: Arc<CountingStore>,
}

impl Fixture {
    fn new(fetcher: StubFetcher) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("resume.tex"), RESUME).unwrap();
        Self {
            dir,
            fetcher: Arc::new(fetcher),
            store: Arc::new(CountingStore::default()),
        }
    }

    fn offline() -> Self {
        Self::new(StubFetcher::failing("network disabled in tests"))
    }

    fn resume_path(&self) -> PathBuf {
        self.dir.path().join("resume.tex")
    }

    fn write_resume(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn output_root(&self) -> PathBuf {
        self.dir.path().join("applications")
    }

    fn ledger(&self) -> TrackerLedger {
        TrackerLedger::new(self.dir.path().join("application_tracker.csv"))
    }

    fn controller(&self, overwrite: bool) -> Controller {
        Controller::new(self.fetcher.clone(), self.store.clone(), self.output_root())
            .with_overwrite(overwrite)
    }

    fn text_request(&self, job_id: Option<&str>) -> JobRequest {
        JobRequest {
            raw_jd_text: Some(JOB_TEXT.to_string()),
            base_resume_path: Some(self.resume_path()),
            job_id: job_id.map(str::to_string),
            company: Some("Acme Analytics".to_string()),
            ..Default::default()
        }
    }
}

fn failed_stage(outcome: &PipelineOutcome) -> Stage {
    match outcome {
        PipelineOutcome::Failed { stage, .. } => *stage,
        other => panic!("expected failure, got {:?}", other),
    }
}

// ===== Tests =====

#[tokio::test]
async fn test_missing_job_source_waits_for_input_without_side_effects() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let request = JobRequest {
        base_resume_path: Some(fx.resume_path()),
        ..Default::default()
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;

    match &outcome {
        PipelineOutcome::WaitingForInput { missing_fields, message } => {
            assert_eq!(missing_fields, &vec!["job_url", "raw_jd_text"]);
            assert!(!message.is_empty());
        }
        other => panic!("expected waiting_for_input, got {:?}", other),
    }
    assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.store.calls.load(Ordering::SeqCst), 0);
    assert!(!ledger.path().exists());
    assert!(!fx.output_root().exists());
}

#[tokio::test]
async fn test_text_posting_produces_full_bundle() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();

    let outcome = fx
        .controller(false)
        .run(fx.text_request(None), &mut ledger)
        .await;
    let bundle = outcome.bundle().expect("pipeline should finish");

    // Derived job id and job folder
    let job_id = &bundle.job_intel_json.job_id;
    assert_eq!(job_id.len(), 12);
    let folder = fx.output_root().join(format!("{}_data_engineer", job_id));
    assert_eq!(bundle.updated_resume_path, folder.join("resume.tex"));
    assert_ne!(bundle.updated_resume_path, fx.resume_path());

    // Base resume untouched, artifacts written
    assert_eq!(std::fs::read_to_string(fx.resume_path()).unwrap(), RESUME);
    assert_eq!(
        std::fs::read_to_string(folder.join("resume.tex")).unwrap(),
        bundle.updated_resume_latex
    );
    assert_eq!(
        std::fs::read_to_string(folder.join("cover_letter.txt")).unwrap(),
        bundle.cover_letter
    );
    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(folder.join("metrics.json")).unwrap())
            .unwrap();
    assert_eq!(metrics["job_id"], job_id.as_str());

    // Extraction
    let intel = &bundle.job_intel_json;
    assert_eq!(intel.requirements.must_have, vec!["Python", "SQL"]);
    assert_eq!(intel.keywords_for_ats, vec!["Python", "SQL", "Go"]);
    assert_eq!(intel.company.name.as_deref(), Some("Acme Analytics"));

    // Tailoring permutes the skill list
    assert!(bundle
        .updated_resume_latex
        .contains("Languages: Python, SQL, Java\n"));

    // Every cited fact is verbatim from the tailored resume
    for entry in &bundle.evidence_mapping {
        if let Evidence::Verbatim { resume_text } = &entry.evidence {
            assert!(bundle.updated_resume_latex.contains(resume_text.as_str()));
            assert!(bundle.cover_letter.contains(resume_text.as_str()));
        }
    }
    assert_eq!(bundle.evidence_mapping.len(), 2);

    // Scoring
    let report = &bundle.score_report;
    assert!((report.keyword_coverage - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.missing_keywords, vec!["Go"]);
    assert_eq!(report.must_have_coverage, 1.0);
    assert_ne!(report.resume_base_hash, report.resume_tailored_hash);
    assert!(bundle.compile_sanity_checks.iter().all(|c| c.passed));
    assert!(bundle.risk_flags.is_empty());

    // Go is not in the resume
    assert!(bundle
        .warnings
        .iter()
        .any(|w| w.item == "Go" && w.stage == Stage::Tailoring));

    // Tracking
    assert!(bundle
        .application_tracker_csv
        .starts_with(&TRACKER_HEADER.join(",")));
    let rows = ledger.read_rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].job_id, *job_id);
    assert_eq!(rows[0].keywords, "Python;SQL;Go");
    assert_eq!(rows[0].status, "Not Applied");
    assert_eq!(rows[0].visa_sponsorship, "Unknown");

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "done");
    assert!(json["updated_resume_latex"].is_string());
}

#[tokio::test]
async fn test_same_posting_gets_same_job_id() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let controller = fx.controller(true);

    let first = controller.run(fx.text_request(None), &mut ledger).await;
    let second = controller.run(fx.text_request(None), &mut ledger).await;

    assert_eq!(
        first.bundle().unwrap().job_intel_json.job_id,
        second.bundle().unwrap().job_intel_json.job_id
    );
}

#[tokio::test]
async fn test_two_runs_append_two_rows_in_order() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let controller = fx.controller(false);

    let first = controller.run(fx.text_request(Some("first")), &mut ledger).await;
    let second = controller.run(fx.text_request(Some("second")), &mut ledger).await;
    assert_eq!(first.stage(), Stage::Done);
    assert_eq!(second.stage(), Stage::Done);

    let rows = ledger.read_rows().unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);

    let content = std::fs::read_to_string(ledger.path()).unwrap();
    assert_eq!(content.matches("job_id,company").count(), 1);
}

#[tokio::test]
async fn test_existing_job_folder_requires_force() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();

    let first = fx
        .controller(false)
        .run(fx.text_request(Some("dup")), &mut ledger)
        .await;
    assert_eq!(first.stage(), Stage::Done);

    let rejected = fx
        .controller(false)
        .run(fx.text_request(Some("dup")), &mut ledger)
        .await;
    assert_eq!(failed_stage(&rejected), Stage::Tailoring);
    assert_eq!(ledger.read_rows().unwrap().len(), 1);

    let forced = fx
        .controller(true)
        .run(fx.text_request(Some("dup")), &mut ledger)
        .await;
    assert_eq!(forced.stage(), Stage::Done);

    // Duplicate ids are appended, not merged
    let rows = ledger.read_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.job_id == "dup"));
}

#[tokio::test]
async fn test_fetch_failure_reports_extracting() {
    let fx = Fixture::new(StubFetcher::failing("HTTP error: 503 Service Unavailable"));
    let mut ledger = fx.ledger();
    let request = JobRequest {
        job_url: Some("https://jobs.example.com/42".to_string()),
        base_resume_path: Some(fx.resume_path()),
        ..Default::default()
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;

    match &outcome {
        PipelineOutcome::Failed { stage, error } => {
            assert_eq!(*stage, Stage::Extracting);
            assert!(error.contains("503"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(outcome.bundle().is_none());
    assert!(!ledger.path().exists());
    assert!(!fx.output_root().exists());
}

#[tokio::test]
async fn test_page_without_description_is_a_fetch_error() {
    let fx = Fixture::new(StubFetcher::serving("<html><body></body></html>"));
    let mut ledger = fx.ledger();
    let request = JobRequest {
        job_url: Some("https://jobs.example.com/empty".to_string()),
        base_resume_path: Some(fx.resume_path()),
        ..Default::default()
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;
    assert_eq!(failed_stage(&outcome), Stage::Extracting);
}

#[tokio::test]
async fn test_fetched_posting_runs_to_done() {
    let fx = Fixture::new(StubFetcher::serving(JOB_PAGE));
    let mut ledger = fx.ledger();
    let request = JobRequest {
        job_url: Some("https://jobs.example.com/rust".to_string()),
        base_resume_path: Some(fx.resume_path()),
        job_id: Some("rust1".to_string()),
        ..Default::default()
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;
    let bundle = outcome.bundle().expect("pipeline should finish");

    let intel = &bundle.job_intel_json;
    assert_eq!(intel.role.title, "Senior Rust Engineer");
    assert_eq!(intel.company.name.as_deref(), Some("Acme Robotics"));
    assert_eq!(intel.source.job_url.as_deref(), Some("https://jobs.example.com/rust"));
    assert_eq!(intel.requirements.must_have, vec!["5+ years Rust", "PostgreSQL"]);
    assert_eq!(
        bundle.updated_resume_path,
        fx.output_root().join("rust1_senior_rust_engineer/resume.tex")
    );
    // Nothing in the resume backs Rust or PostgreSQL
    assert_eq!(bundle.score_report.must_have_coverage, 0.0);
    assert!(bundle
        .evidence_mapping
        .iter()
        .all(|m| m.evidence == Evidence::Unverifiable));

    let rows = ledger.read_rows().unwrap();
    assert_eq!(rows[0].job_url, "https://jobs.example.com/rust");
}

#[tokio::test]
async fn test_url_and_text_together_fail_validation() {
    let fx = Fixture::new(StubFetcher::serving(JOB_PAGE));
    let mut ledger = fx.ledger();
    let request = JobRequest {
        job_url: Some("https://jobs.example.com/rust".to_string()),
        ..fx.text_request(None)
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;
    assert_eq!(failed_stage(&outcome), Stage::Validating);
    assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_resume_file_fails_validating() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let request = JobRequest {
        base_resume_path: Some(fx.dir.path().join("nope.tex")),
        ..fx.text_request(None)
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;
    assert_eq!(failed_stage(&outcome), Stage::Validating);
}

#[tokio::test]
async fn test_job_id_cannot_point_at_base_resume() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    // Where `<output_root>/../old_data_engineer` would resolve
    let base = fx.write_resume("old_data_engineer/resume.tex", RESUME);
    let request = JobRequest {
        base_resume_path: Some(base.clone()),
        ..fx.text_request(Some("../old"))
    };

    let outcome = fx.controller(true).run(request, &mut ledger).await;
    assert_eq!(failed_stage(&outcome), Stage::Validating);
    assert_eq!(std::fs::read_to_string(&base).unwrap(), RESUME);
    assert!(!fx.output_root().exists());
    assert!(!ledger.path().exists());
}

#[tokio::test]
async fn test_base_resume_inside_job_folder_is_not_overwritten() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let base = fx.write_resume("applications/dup_data_engineer/resume.tex", RESUME);
    let request = JobRequest {
        base_resume_path: Some(base.clone()),
        ..fx.text_request(Some("dup"))
    };

    let outcome = fx.controller(true).run(request, &mut ledger).await;
    assert_eq!(failed_stage(&outcome), Stage::Tailoring);
    assert_eq!(std::fs::read_to_string(&base).unwrap(), RESUME);
    assert!(ledger.read_rows().unwrap().is_empty());
}

#[tokio::test]
async fn test_braced_skill_items_keep_latex_balanced() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let resume = "\\documentclass{article}
\\begin{document}
\\begin{itemize}
\\item \\textbf{Languages}: \\textit{Java, Go}, Python, SQL \\\\
\\end{itemize}
\\end{document}
";
    let base = fx.write_resume("braced.tex", resume);
    let request = JobRequest {
        base_resume_path: Some(base),
        ..fx.text_request(Some("braced"))
    };

    let outcome = fx.controller(false).run(request, &mut ledger).await;
    let bundle = outcome.bundle().expect("pipeline should finish");

    assert!(bundle
        .updated_resume_latex
        .contains("\\item \\textbf{Languages}: Python, SQL, \\textit{Java, Go} \\\\\n"));
    assert_eq!(bundle.compile_sanity_checks.len(), 4);
    assert!(bundle.compile_sanity_checks.iter().all(|c| c.passed));
}

/// Writes through to disk but reports a digest that never matches.
struct SkewedDigestStore;

#[async_trait]
impl ArtifactStore for SkewedDigestStore {
    async fn read_text(&self, path: &Path) -> Result<String> {
        FsOps.read_text(path).await
    }

    async fn write_text(&self, path: &Path, content: &str, overwrite: bool) -> Result<()> {
        FsOps.write_text(path, content, overwrite).await
    }

    async fn create_dir(&self, path: &Path) -> Result<bool> {
        FsOps.create_dir(path).await
    }

    async fn sha256(&self, _path: &Path) -> Result<String> {
        Ok("0".repeat(64))
    }
}

#[tokio::test]
async fn test_written_resume_must_match_scored_text() {
    let fx = Fixture::offline();
    let mut ledger = fx.ledger();
    let controller = Controller::new(fx.fetcher.clone(), Arc::new(SkewedDigestStore), fx.output_root());

    let outcome = controller.run(fx.text_request(Some("skew")), &mut ledger).await;
    match &outcome {
        PipelineOutcome::Failed { stage, error } => {
            assert_eq!(*stage, Stage::Scoring);
            assert!(error.contains("resume_tailored_hash"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(ledger.read_rows().unwrap().is_empty());
}
