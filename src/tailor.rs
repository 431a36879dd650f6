// src/tailor.rs
//! Resume tailoring.
//!
//! The tailored resume is the base text with a targeting comment on top and
//! its skill lists (`Label: a, b, c`) reordered so the job's keywords lead.
//! Items are only permuted, never added, so every claim in the tailored
//! resume already exists in the base resume. Items are split at brace depth 0
//! and the result is checked against the base for structural regressions.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::latex::{compare_structure, find_top_level, line_code, split_top_level};
use crate::scoring::requirement_supported;
use crate::types::job_intel::JobIntel;
use crate::types::resume::{ResumeDocument, TailorChange, TailoredResume};
use crate::utils::{contains_term, job_folder_name, strip_latex_comments};

pub const TAILORED_RESUME_FILE: &str = "resume.tex";

const MAX_LABEL_LEN: usize = 48;

pub fn tailor_resume(base: &ResumeDocument, intel: &JobIntel, output_root: &Path) -> TailoredResume {
    let job_folder = output_root.join(job_folder_name(&intel.job_id, &intel.role.title));
    let path = job_folder.join(TAILORED_RESUME_FILE);

    // Focus keywords first, then the remaining ATS keywords.
    let priority: Vec<&String> = {
        let mut seen = Vec::<&String>::new();
        for keyword in intel.resume_focus().iter().chain(&intel.keywords_for_ats) {
            if !seen.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                seen.push(keyword);
            }
        }
        seen
    };

    let mut changes = vec![TailorChange {
        section: "header".to_string(),
        change: "Added targeting comment".to_string(),
        reason: format!("Marks the resume as tailored for job {}", intel.job_id),
    }];

    let mut content = targeting_header(intel);
    for line in base.content.split_inclusive('\n') {
        match reorder_skill_line(line, &priority) {
            Some((reordered, label, moved)) => {
                debug!("Reordered skill list `{}`", label);
                changes.push(TailorChange {
                    section: label,
                    change: format!("Moved {} to the front", moved.join(", ")),
                    reason: "Matches job keywords".to_string(),
                });
                content.push_str(&reordered);
            }
            None => content.push_str(line),
        }
    }

    let base_body = strip_latex_comments(&base.content);
    let matched_keywords: Vec<String> = intel
        .keywords_for_ats
        .iter()
        .filter(|keyword| contains_term(&base_body, keyword))
        .cloned()
        .collect();

    let mut missing_unverifiable: Vec<String> = Vec::new();
    let unmatched_keywords = intel
        .keywords_for_ats
        .iter()
        .filter(|keyword| !contains_term(&base_body, keyword));
    let unsupported_must_haves = intel
        .requirements
        .must_have
        .iter()
        .filter(|requirement| !requirement_supported(&base_body, requirement));
    for item in unmatched_keywords.chain(unsupported_must_haves) {
        if !missing_unverifiable
            .iter()
            .any(|m| m.eq_ignore_ascii_case(item))
        {
            missing_unverifiable.push(item.clone());
        }
    }

    let compile_sanity_checks = compare_structure(&base.content, &content);
    let mut risk_flags = Vec::new();
    for check in &compile_sanity_checks {
        if !check.base_passed {
            risk_flags.push(format!("base resume fails {}", check.check));
        } else if check.regressed() {
            warn!(
                "Tailored resume for {} fails {}: {}",
                intel.job_id,
                check.check,
                check.detail.as_deref().unwrap_or("")
            );
        }
    }
    if matched_keywords.is_empty() && !intel.keywords_for_ats.is_empty() {
        risk_flags.push("no job keyword appears in the base resume".to_string());
    }

    info!(
        "Tailored resume for {}: {} keywords matched, {} unverifiable, {} changes",
        intel.job_id,
        matched_keywords.len(),
        missing_unverifiable.len(),
        changes.len()
    );

    TailoredResume {
        job_folder,
        document: ResumeDocument::new(path, content),
        matched_keywords,
        missing_unverifiable,
        changes,
        risk_flags,
        compile_sanity_checks,
    }
}

fn targeting_header(intel: &JobIntel) -> String {
    let mut header = format!("% Tailored resume for job {}\n", single_line(&intel.job_id));
    header.push_str(&format!("% Role: {}\n", single_line(&intel.role.title)));
    if let Some(company) = &intel.company.name {
        header.push_str(&format!("% Company: {}\n", single_line(company)));
    }
    header
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reorder the items of a `Label: a, b, c` line so items mentioning
/// higher-priority keywords come first. Commas inside `{...}` groups do not
/// split items. Returns the new line, the label and the items that moved, or
/// `None` when the line is not a skill list, its braces do not balance, or
/// the order is already right.
fn reorder_skill_line(line: &str, priority: &[&String]) -> Option<(String, String, Vec<String>)> {
    // Comment lines, and lines with a trailing comment
    if line.trim_start().starts_with('%') || line_code(line).len() != line.len() {
        return None;
    }

    let (body, terminator) = match line.strip_suffix('\n') {
        Some(body) => match body.strip_suffix('\r') {
            Some(body) => (body, "\r\n"),
            None => (body, "\n"),
        },
        None => (line, ""),
    };

    // Keep a trailing `\\` and surrounding whitespace as they are.
    let trimmed = body.trim_end();
    let core = trimmed.strip_suffix("\\\\").unwrap_or(trimmed).trim_end();
    let tail = &body[core.len()..];

    let colon = find_top_level(core, ':')?;
    let (prefix, list) = (&core[..=colon], &core[colon + 1..]);
    let label = skill_label(&prefix[..colon]);
    if label.is_empty() || label.len() > MAX_LABEL_LEN || prefix.contains(',') {
        return None;
    }
    // `https://...` and similar
    if list.starts_with("//") {
        return None;
    }

    let items: Vec<&str> = split_top_level(list, ',')?
        .into_iter()
        .map(str::trim)
        .collect();
    if items.len() < 2 || items.iter().any(|item| item.is_empty()) {
        return None;
    }

    let rank = |item: &str| {
        priority
            .iter()
            .position(|keyword| contains_term(item, keyword))
            .unwrap_or(usize::MAX)
    };
    let mut ordered = items.clone();
    ordered.sort_by_key(|item| rank(*item));
    if ordered == items {
        return None;
    }

    let moved: Vec<String> = ordered
        .iter()
        .filter(|item| rank(**item) != usize::MAX)
        .map(|item| item.to_string())
        .collect();

    let leading = &list[..list.len() - list.trim_start().len()];
    let reordered = format!(
        "{}{}{}{}{}",
        prefix,
        leading,
        ordered.join(", "),
        tail,
        terminator
    );
    Some((reordered, label, moved))
}

/// `\item \textbf{Languages}` -> `Languages`
fn skill_label(raw: &str) -> String {
    let mut label = raw.trim();
    if let Some(rest) = label.strip_prefix("\\item") {
        label = rest.trim_start();
    }
    for command in ["\\textbf{", "\\textit{", "\\emph{", "\\textsc{"] {
        if let Some(rest) = label.strip_prefix(command) {
            label = rest;
        }
    }
    label
        .trim_matches(|c: char| c == '{' || c == '}' || c.is_whitespace())
        .to_string()
}
