// src/cover_letter.rs
//! Cover letter drafting restricted to facts found in the resume

use tracing::info;

use crate::job_intel::requirement_terms;
use crate::types::job_intel::JobIntel;
use crate::types::resume::{CoverLetter, Evidence, RequirementEvidence};
use crate::utils::{contains_term, normalize_language};

pub const COVER_LETTER_FILE: &str = "cover_letter.txt";

struct Phrases {
    greeting: &'static str,
    opening: &'static str,
    position: &'static str,
    at_company: &'static str,
    evidence_intro: &'static str,
    no_evidence: &'static str,
    closing: &'static str,
    sign_off: &'static str,
}

const EN: Phrases = Phrases {
    greeting: "Dear Hiring Team,",
    opening: "I am writing to apply for the",
    position: " position",
    at_company: "at",
    evidence_intro: "The points below are taken directly from my resume:",
    no_evidence: "My resume is attached for your review.",
    closing: "Thank you for your time and consideration. I would welcome the opportunity to discuss the role.",
    sign_off: "Kind regards,",
};

const DE: Phrases = Phrases {
    greeting: "Sehr geehrte Damen und Herren,",
    opening: "hiermit bewerbe ich mich auf die Position",
    position: "",
    at_company: "bei",
    evidence_intro: "Die folgenden Punkte stammen direkt aus meinem Lebenslauf:",
    no_evidence: "Meinen Lebenslauf finden Sie im Anhang.",
    closing: "Vielen Dank für Ihre Zeit. Über die Gelegenheit zu einem persönlichen Gespräch freue ich mich.",
    sign_off: "Mit freundlichen Grüßen",
};

/// Draft a letter that cites, for every must-have, the first resume line
/// backing it. Requirements without such a line are mapped as unverifiable
/// and left out of the letter.
pub fn draft_cover_letter(resume: &str, intel: &JobIntel) -> CoverLetter {
    let mapping: Vec<RequirementEvidence> = intel
        .requirements
        .must_have
        .iter()
        .map(|requirement| RequirementEvidence {
            requirement: requirement.clone(),
            evidence: find_evidence(resume, requirement)
                .map(|resume_text| Evidence::Verbatim { resume_text })
                .unwrap_or(Evidence::Unverifiable),
        })
        .collect();

    let phrases = match normalize_language(Some(&intel.source.language)).as_str() {
        "de" => &DE,
        _ => &EN,
    };

    let title = intel.role.title.trim();
    let mut letter = format!("{}\n\n", phrases.greeting);
    match &intel.company.name {
        Some(company) => letter.push_str(&format!(
            "{} {}{} {} {}.",
            phrases.opening, title, phrases.position, phrases.at_company, company
        )),
        None => letter.push_str(&format!("{} {}{}.", phrases.opening, title, phrases.position)),
    }
    letter.push_str("\n\n");

    let cited: Vec<(&str, &str)> = mapping
        .iter()
        .filter_map(|entry| match &entry.evidence {
            Evidence::Verbatim { resume_text } => {
                Some((entry.requirement.as_str(), resume_text.as_str()))
            }
            Evidence::Unverifiable => None,
        })
        .collect();

    if cited.is_empty() {
        letter.push_str(phrases.no_evidence);
        letter.push_str("\n\n");
    } else {
        letter.push_str(phrases.evidence_intro);
        letter.push('\n');
        for (requirement, text) in &cited {
            letter.push_str(&format!("- {}: \"{}\"\n", requirement, text));
        }
        letter.push('\n');
    }

    letter.push_str(phrases.closing);
    letter.push_str("\n\n");
    letter.push_str(phrases.sign_off);
    letter.push('\n');

    let mut missing_information = Vec::new();
    if intel.company.name.is_none() {
        missing_information.push("company name".to_string());
    }
    missing_information.push("hiring manager name".to_string());

    info!(
        "Drafted cover letter for {}: {} of {} must-haves backed by the resume",
        intel.job_id,
        cited.len(),
        mapping.len()
    );

    CoverLetter {
        letter,
        mapping,
        missing_information,
    }
}

/// First non-comment resume line mentioning the requirement, stripped of
/// list markup. Always a substring of `resume`.
fn find_evidence(resume: &str, requirement: &str) -> Option<String> {
    let terms = requirement_terms(requirement);
    resume
        .lines()
        .filter(|line| !line.trim_start().starts_with('%'))
        .find(|line| terms.iter().any(|term| contains_term(line, term)))
        .map(clean_evidence)
        .filter(|text| !text.is_empty())
}

fn clean_evidence(line: &str) -> String {
    let mut text = line.trim();
    if let Some(rest) = text.strip_prefix("\\item") {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("\\\\") {
        text = rest.trim_end();
    }
    text.to_string()
}
