// src/types/tracker.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FieldIssue;

/// Ledger columns, in file order.
pub const TRACKER_HEADER: [&str; 13] = [
    "job_id",
    "company",
    "role_title",
    "location",
    "remote_policy",
    "job_url",
    "date_applied",
    "status",
    "visa_sponsorship",
    "keywords",
    "resume_link",
    "cover_letter_link",
    "notes",
];

pub const STATUS_APPLIED: &str = "Applied";
pub const STATUS_NOT_APPLIED: &str = "Not Applied";

// ===== Tracker Row =====

/// One application in the ledger. Field order matches [`TRACKER_HEADER`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerRow {
    pub job_id: String,
    pub company: String,
    pub role_title: String,
    pub location: String,
    pub remote_policy: String,
    pub job_url: String,
    pub date_applied: String,
    pub status: String,
    /// `Yes`, `No` or `Unknown`
    pub visa_sponsorship: String,
    /// Semicolon-separated
    pub keywords: String,
    pub resume_link: String,
    pub cover_letter_link: String,
    pub notes: String,
}

impl TrackerRow {
    pub fn default_status(date_applied: Option<NaiveDate>) -> &'static str {
        if date_applied.is_some() {
            STATUS_APPLIED
        } else {
            STATUS_NOT_APPLIED
        }
    }

    pub fn validate(&self) -> Result<(), FieldIssue> {
        if self.job_id.trim().is_empty() {
            return Err(FieldIssue::new("job_id", "must not be empty"));
        }
        if self.role_title.trim().is_empty() {
            return Err(FieldIssue::new("role_title", "must not be empty"));
        }
        if self.resume_link.trim().is_empty() {
            return Err(FieldIssue::new("resume_link", "must reference the tailored resume"));
        }
        Ok(())
    }
}
