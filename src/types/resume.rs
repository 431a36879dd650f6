// src/types/resume.rs
//! Resume documents and the stage outputs derived from them

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::digest::sha256_hex;
use crate::error::FieldIssue;
use crate::latex::SanityCheck;
use crate::utils::normalize_path;

// ===== Resume Document =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub path: PathBuf,
    pub content: String,
    pub sha256: String,
}

impl ResumeDocument {
    pub fn new(path: PathBuf, content: String) -> Self {
        let sha256 = sha256_hex(content.as_bytes());
        Self {
            path,
            content,
            sha256,
        }
    }
}

// ===== Tailored Resume =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorChange {
    pub section: String,
    pub change: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredResume {
    pub job_folder: PathBuf,
    pub document: ResumeDocument,
    pub matched_keywords: Vec<String>,
    /// Keywords and must-haves the base resume gives no evidence for.
    pub missing_unverifiable: Vec<String>,
    pub changes: Vec<TailorChange>,
    /// Structural problems the base resume already has.
    pub risk_flags: Vec<String>,
    pub compile_sanity_checks: Vec<SanityCheck>,
}

impl TailoredResume {
    /// Paths are compared after `.`/`..` are resolved, so a job folder name
    /// cannot climb out of `output_root` or land on the base resume.
    pub fn validate(&self, base_path: &Path, output_root: &Path) -> Result<(), FieldIssue> {
        let path = normalize_path(&self.document.path);
        let folder = normalize_path(&self.job_folder);
        let root = normalize_path(output_root);

        if path == normalize_path(base_path) {
            return Err(FieldIssue::new(
                "path",
                format!(
                    "tailored resume would overwrite the base resume at {}",
                    base_path.display()
                ),
            ));
        }
        if folder == root || !folder.starts_with(&root) {
            return Err(FieldIssue::new(
                "path",
                format!("job folder {} is outside {}", folder.display(), root.display()),
            ));
        }
        if !path.starts_with(&folder) {
            return Err(FieldIssue::new(
                "path",
                "tailored resume must live inside its job folder",
            ));
        }
        if self.document.content.trim().is_empty() {
            return Err(FieldIssue::new("content", "tailored resume is empty"));
        }
        if let Some(check) = self.compile_sanity_checks.iter().find(|c| c.regressed()) {
            return Err(FieldIssue::new(
                "compile_sanity_checks",
                format!(
                    "tailoring broke `{}`: {}",
                    check.check,
                    check.detail.as_deref().unwrap_or("check failed")
                ),
            ));
        }
        Ok(())
    }
}

// ===== Cover Letter =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// Text copied verbatim from the resume.
    Verbatim { resume_text: String },
    /// Nothing in the resume supports the requirement.
    Unverifiable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementEvidence {
    pub requirement: String,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub letter: String,
    pub mapping: Vec<RequirementEvidence>,
    pub missing_information: Vec<String>,
}

impl CoverLetter {
    /// Every must-have gets a mapping entry and every cited fact is present in
    /// `resume` verbatim.
    pub fn validate(&self, resume: &str, must_have: &[String]) -> Result<(), FieldIssue> {
        if self.letter.trim().is_empty() {
            return Err(FieldIssue::new("letter", "cover letter is empty"));
        }
        for requirement in must_have {
            if !self.mapping.iter().any(|m| &m.requirement == requirement) {
                return Err(FieldIssue::new(
                    "mapping",
                    format!("no entry for must-have `{}`", requirement),
                ));
            }
        }
        for entry in &self.mapping {
            if let Evidence::Verbatim { resume_text } = &entry.evidence {
                if resume_text.trim().is_empty() || !resume.contains(resume_text.as_str()) {
                    return Err(FieldIssue::new(
                        "mapping",
                        format!(
                            "evidence for `{}` is not present in the resume",
                            entry.requirement
                        ),
                    ));
                }
                if !self.letter.contains(resume_text.as_str()) {
                    return Err(FieldIssue::new(
                        "letter",
                        format!("evidence for `{}` is not quoted", entry.requirement),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn unverifiable(&self) -> impl Iterator<Item = &str> {
        self.mapping.iter().filter_map(|m| match m.evidence {
            Evidence::Unverifiable => Some(m.requirement.as_str()),
            Evidence::Verbatim { .. } => None,
        })
    }
}
