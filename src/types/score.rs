// src/types/score.rs
use serde::{Deserialize, Serialize};

use crate::error::FieldIssue;

// ===== Line Diff =====

/// One line-level edit. Lines keep their `\n` terminator so that replaying the
/// edits reproduces the target text byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "line", rename_all = "snake_case")]
pub enum DiffOp {
    Equal(String),
    Insert(String),
    Delete(String),
}

impl DiffOp {
    pub fn line(&self) -> &str {
        match self {
            DiffOp::Equal(l) | DiffOp::Insert(l) | DiffOp::Delete(l) => l,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, DiffOp::Equal(_))
    }
}

// ===== Score Report =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub job_id: String,
    pub resume_base_hash: String,
    pub resume_tailored_hash: String,
    pub diff: Vec<DiffOp>,
    /// Inserted plus deleted lines.
    pub diff_size: usize,
    pub unified_diff: String,
    pub keyword_coverage: f64,
    pub must_have_coverage: f64,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

impl ScoreReport {
    pub fn validate(&self) -> Result<(), FieldIssue> {
        for (field, hash) in [
            ("resume_base_hash", &self.resume_base_hash),
            ("resume_tailored_hash", &self.resume_tailored_hash),
        ] {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(FieldIssue::new(field, "not a SHA-256 hex digest"));
            }
        }
        for (field, ratio) in [
            ("keyword_coverage", self.keyword_coverage),
            ("must_have_coverage", self.must_have_coverage),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(FieldIssue::new(field, format!("{} is outside [0, 1]", ratio)));
            }
        }
        Ok(())
    }
}
