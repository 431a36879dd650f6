// src/tracker.rs
//! Application tracking: one ledger row per pipeline run

use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;

use crate::core::ledger::{row_to_csv, TrackerLedger};
use crate::types::job_intel::JobIntel;
use crate::types::tracker::TrackerRow;

/// Caller-supplied metadata that is not derived from the posting.
#[derive(Debug, Clone, Default)]
pub struct ApplicationMeta {
    pub date_applied: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub fn build_row(
    intel: &JobIntel,
    resume_link: &Path,
    cover_letter_link: &Path,
    meta: &ApplicationMeta,
) -> TrackerRow {
    TrackerRow {
        job_id: intel.job_id.clone(),
        company: intel.company.name.clone().unwrap_or_default(),
        role_title: intel.role.title.clone(),
        location: intel.location.city.clone().unwrap_or_default(),
        remote_policy: intel.location.remote_policy.clone(),
        job_url: intel.source.job_url.clone().unwrap_or_default(),
        date_applied: meta
            .date_applied
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        status: TrackerRow::default_status(meta.date_applied).to_string(),
        visa_sponsorship: intel.location.visa_sponsorship.clone(),
        keywords: intel.keywords_for_ats.join(";"),
        resume_link: resume_link.display().to_string(),
        cover_letter_link: cover_letter_link.display().to_string(),
        notes: meta.notes.clone().unwrap_or_default(),
    }
}

/// Append `row` to the ledger and return the header plus row as CSV text.
pub fn record_application(ledger: &mut TrackerLedger, row: &TrackerRow) -> Result<String> {
    ledger.append(row)?;
    row_to_csv(row)
}
