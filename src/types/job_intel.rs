// src/types/job_intel.rs
//! Structured job posting record shared by every downstream stage

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FieldIssue;

pub const RESUME_FOCUS: &str = "resume_focus";
pub const COVER_LETTER_ANGLES: &str = "cover_letter_angles";

// ===== Job Intel =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobIntel {
    pub job_id: String,
    pub source: JobSource,
    pub role: Role,
    pub company: Company,
    pub location: JobLocation,
    pub requirements: Requirements,
    pub keywords_for_ats: Vec<String>,
    pub tailoring_guidance: BTreeMap<String, Vec<String>>,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSource {
    pub job_url: Option<String>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub title: String,
    pub level: String,
    pub employment_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    pub city: Option<String>,
    pub remote_policy: String,
    /// `Yes`, `No` or `Unknown`
    pub visa_sponsorship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    pub must_have: Vec<String>,
    pub nice_to_have: Vec<String>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.must_have.is_empty() && self.nice_to_have.is_empty()
    }
}

impl JobIntel {
    /// Boundary checks run by the controller before the record is handed on.
    pub fn validate(&self) -> Result<(), FieldIssue> {
        if self.job_id.trim().is_empty() {
            return Err(FieldIssue::new("job_id", "must not be empty"));
        }
        if self.role.title.trim().is_empty() {
            return Err(FieldIssue::new("role.title", "must not be empty"));
        }
        if !self.requirements.is_empty() && self.requirements.must_have.is_empty() {
            return Err(FieldIssue::new(
                "requirements.must_have",
                "requirements were found but none is classified as must-have",
            ));
        }
        if let Some(blank) = self
            .requirements
            .must_have
            .iter()
            .chain(&self.requirements.nice_to_have)
            .position(|item| item.trim().is_empty())
        {
            return Err(FieldIssue::new(
                "requirements",
                format!("item {} is empty", blank),
            ));
        }
        if self.keywords_for_ats.iter().any(|k| k.trim().is_empty()) {
            return Err(FieldIssue::new("keywords_for_ats", "contains an empty keyword"));
        }
        if !self.requirements.must_have.is_empty()
            && self
                .tailoring_guidance
                .get(RESUME_FOCUS)
                .map_or(true, |focus| focus.is_empty())
        {
            return Err(FieldIssue::new(
                "tailoring_guidance.resume_focus",
                "must not be empty when must-have requirements exist",
            ));
        }
        Ok(())
    }

    pub fn resume_focus(&self) -> &[String] {
        self.tailoring_guidance
            .get(RESUME_FOCUS)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_intel;
    use super::*;

    #[test]
    fn test_valid_intel_passes() {
        assert!(sample_intel().validate().is_ok());
    }

    #[test]
    fn test_missing_job_id_rejected() {
        let mut intel = sample_intel();
        intel.job_id = "  ".to_string();
        assert_eq!(intel.validate().unwrap_err().field, "job_id");
    }

    #[test]
    fn test_nice_to_have_without_must_have_rejected() {
        let mut intel = sample_intel();
        intel.requirements.must_have.clear();
        let issue = intel.validate().unwrap_err();
        assert_eq!(issue.field, "requirements.must_have");
    }

    #[test]
    fn test_posting_without_requirements_is_accepted() {
        let mut intel = sample_intel();
        intel.requirements = Requirements::default();
        intel.keywords_for_ats.clear();
        intel.tailoring_guidance.clear();
        assert!(intel.validate().is_ok());
    }

    #[test]
    fn test_resume_focus_required_with_must_haves() {
        let mut intel = sample_intel();
        intel.tailoring_guidance.remove(RESUME_FOCUS);
        assert_eq!(
            intel.validate().unwrap_err().field,
            "tailoring_guidance.resume_focus"
        );
    }

    #[test]
    fn test_intel_json_shape() {
        let json = serde_json::to_value(sample_intel()).unwrap();
        assert_eq!(json["requirements"]["must_have"][0], "Python");
        assert_eq!(json["source"]["language"], "en");
        assert_eq!(json["tailoring_guidance"]["resume_focus"][1], "SQL");
    }
}
