// src/scoring/mod.rs
//! Resume scoring: content hashes, line diff and keyword coverage

pub mod diff;

use tracing::debug;

use crate::job_intel::requirement_terms;
use crate::types::job_intel::JobIntel;
use crate::types::resume::ResumeDocument;
use crate::types::score::ScoreReport;
use crate::utils::{contains_term, strip_latex_comments};

pub use diff::{apply_diff, diff_lines, render_unified};

/// Score the tailored resume against the base resume and the job's keywords.
pub fn score_resumes(
    base: &ResumeDocument,
    tailored: &ResumeDocument,
    intel: &JobIntel,
) -> ScoreReport {
    score_documents(
        &intel.job_id,
        base,
        tailored,
        &intel.keywords_for_ats,
        &intel.requirements.must_have,
    )
}

pub fn score_documents(
    job_id: &str,
    base: &ResumeDocument,
    tailored: &ResumeDocument,
    keywords: &[String],
    must_have: &[String],
) -> ScoreReport {
    let ops = diff::diff_lines(&base.content, &tailored.content);
    let unified_diff = diff::render_unified(
        &ops,
        &base.path.display().to_string(),
        &tailored.path.display().to_string(),
        diff::UNIFIED_CONTEXT,
    );

    let body = strip_latex_comments(&tailored.content);
    let (matched_keywords, missing_keywords): (Vec<String>, Vec<String>) = keywords
        .iter()
        .cloned()
        .partition(|keyword| contains_term(&body, keyword));

    let must_matched = must_have
        .iter()
        .filter(|requirement| requirement_supported(&body, requirement))
        .count();

    let keyword_coverage = ratio(matched_keywords.len(), keywords.len());
    let must_have_coverage = ratio(must_matched, must_have.len());
    debug!(
        "Coverage for {}: keywords {:.2}, must-have {:.2}",
        job_id, keyword_coverage, must_have_coverage
    );

    ScoreReport {
        job_id: job_id.to_string(),
        resume_base_hash: base.sha256.clone(),
        resume_tailored_hash: tailored.sha256.clone(),
        diff_size: diff::diff_size(&ops),
        diff: ops,
        unified_diff,
        keyword_coverage,
        must_have_coverage,
        matched_keywords,
        missing_keywords,
    }
}

/// Whether `text` mentions the requirement or one of its condensed keywords.
pub fn requirement_supported(text: &str, requirement: &str) -> bool {
    requirement_terms(requirement)
        .iter()
        .any(|term| contains_term(text, term))
}

fn ratio(found: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        found as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::sha256_hex;
    use crate::types::job_intel::fixtures::sample_intel;
    use std::path::PathBuf;

    fn doc(path: &str, content: &str) -> ResumeDocument {
        ResumeDocument::new(PathBuf::from(path), content.to_string())
    }

    #[test]
    fn test_keyword_coverage() {
        let base = doc("base.tex", "Skills: Python\n");
        let tailored = doc("out/resume.tex", "Skills: Python, SQL\n");
        let report = score_resumes(&base, &tailored, &sample_intel());

        assert!((report.keyword_coverage - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.matched_keywords, vec!["Python", "SQL"]);
        assert_eq!(report.missing_keywords, vec!["Go"]);
        assert_eq!(report.must_have_coverage, 1.0);
        assert!(report.validate().is_ok());
    }

    #[test]
    fn test_word_boundaries() {
        let base = doc("base.tex", "Worked at Google\n");
        let report = score_documents("j", &base, &base, &["Go".to_string()], &[]);
        assert_eq!(report.keyword_coverage, 0.0);
        assert_eq!(report.missing_keywords, vec!["Go"]);
    }

    #[test]
    fn test_empty_keywords_score_zero() {
        let base = doc("base.tex", "anything\n");
        let report = score_documents("j", &base, &base, &[], &[]);
        assert_eq!(report.keyword_coverage, 0.0);
        assert_eq!(report.must_have_coverage, 0.0);
        assert_eq!(report.diff_size, 0);
        assert!(report.unified_diff.is_empty());
    }

    #[test]
    fn test_hashes_and_diff() {
        let base = doc("base.tex", "a\nb\n");
        let tailored = doc("out/resume.tex", "% header\na\nb\n");
        let report = score_documents("j", &base, &tailored, &[], &[]);

        assert_eq!(report.resume_base_hash, sha256_hex(b"a\nb\n"));
        assert_eq!(report.resume_tailored_hash, sha256_hex(b"% header\na\nb\n"));
        assert_eq!(report.diff_size, 1);
        assert_eq!(apply_diff(&base.content, &report.diff).unwrap(), tailored.content);
        assert!(report.unified_diff.starts_with("--- base.tex\n+++ out/resume.tex\n"));
    }

    #[test]
    fn test_comments_do_not_count_as_coverage() {
        let base = doc("base.tex", "Skills: Python\n");
        let tailored = doc("out/resume.tex", "% Targeting: SQL, Go\nSkills: Python\n");
        let report = score_resumes(&base, &tailored, &sample_intel());
        assert_eq!(report.matched_keywords, vec!["Python"]);
        assert_eq!(report.must_have_coverage, 0.5);
    }

    #[test]
    fn test_must_have_matches_condensed_keywords() {
        let text = "Built pipelines on PostgreSQL";
        assert!(requirement_supported(text, "Erfahrung mit PostgreSQL und Docker"));
        assert!(!requirement_supported(text, "Kubernetes"));
    }
}
