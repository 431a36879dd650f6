// src/job_intel/extractor.rs
//! Heuristic job description parser.
//!
//! Requirements are classified from posting language: section headers set the
//! class for the lines below them, `Label: a, b, c` segments classify their
//! own items, and inline cues ("required", "a plus") classify a single
//! sentence. The result is advisory; precision is not guaranteed.

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::job_intel::job_scraper::JobPosting;
use crate::types::job_intel::{
    Company, JobIntel, JobLocation, JobSource, Requirements, Role, COVER_LETTER_ANGLES,
    RESUME_FOCUS,
};
use crate::utils::contains_term;

const MAX_FOCUS: usize = 8;
const MAX_ANGLES: usize = 3;
const MAX_ITEM_LEN: usize = 160;
const MAX_KEYWORD_WORDS: usize = 3;
const LONG_MUST_HAVE_LIST: usize = 12;

const NICE_HEADERS: &[&str] = &[
    "nice to have",
    "nice-to-have",
    "good to have",
    "preferred",
    "bonus",
    "bonus points",
    "pluses",
    "plus",
    "optional",
    "wünschenswert",
    "von vorteil",
];

const MUST_HEADERS: &[&str] = &[
    "requirements",
    "requirement",
    "required",
    "must have",
    "must-have",
    "must haves",
    "qualifications",
    "what you bring",
    "what we expect",
    "what we're looking for",
    "your profile",
    "who you are",
    "skills",
    "anforderungen",
    "profil",
    "dein profil",
    "ihr profil",
    "das bringst du mit",
    "voraussetzungen",
];

const OTHER_HEADERS: &[&str] = &[
    "responsibilities",
    "what you will do",
    "what you'll do",
    "what you’ll do",
    "your tasks",
    "tasks",
    "about",
    "about us",
    "about the role",
    "benefits",
    "what we offer",
    "we offer",
    "perks",
    "aufgaben",
    "deine aufgaben",
    "ihre aufgaben",
    "wir bieten",
    "über uns",
    "the role",
    "overview",
];

const NICE_CUES: &[&str] = &[
    "nice to have",
    "a plus",
    "is a plus",
    "preferred",
    "bonus",
    "ideally",
    "von vorteil",
    "wünschenswert",
];

const MUST_CUES: &[&str] = &[
    "required",
    "must",
    "mandatory",
    "essential",
    "erforderlich",
    "zwingend",
    "setzen voraus",
];

/// Cue phrases stripped from the end of a requirement item.
const TRAILING_CUES: &[&str] = &[
    "is required",
    "required",
    "is a plus",
    "a plus",
    "is preferred",
    "preferred",
    "nice to have",
    "mandatory",
    "is a must",
    "a must",
    "erforderlich",
    "wünschenswert",
    "von vorteil",
    "(required)",
    "(preferred)",
    "(nice to have)",
];

const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "with", "for", "to", "on", "at", "as", "in", "is", "be",
    "experience", "experienced", "knowledge", "proficiency", "proficient", "familiarity",
    "familiar", "understanding", "strong", "solid", "good", "excellent", "deep", "in-depth",
    "working", "hands-on", "practical", "proven", "professional", "years", "year", "yrs", "plus",
    "required", "preferred", "must", "have", "has", "should", "skills", "skill", "ability",
    "expertise", "background", "ideally", "nice", "bonus", "mandatory", "least", "minimum", "etc",
    "mit", "und", "oder", "im", "der", "die", "das", "von", "erfahrung", "kenntnisse", "gute",
    "sehr", "fundierte", "jahre", "idealerweise", "vorteil", "erforderlich", "wünschenswert",
];

const GERMAN_MARKERS: &[&str] = &[
    "und", "der", "die", "das", "mit", "für", "wir", "sie", "du", "ist", "ein", "eine", "bei",
    "auf", "zu", "von", "den", "dem", "unser", "ihre", "deine", "erfahrung", "kenntnisse",
];

const ENGLISH_MARKERS: &[&str] = &[
    "and", "the", "with", "for", "we", "you", "is", "a", "an", "to", "of", "our", "your", "on",
    "experience", "skills", "will",
];

const BUZZWORDS: &[&str] = &[
    "rockstar",
    "ninja",
    "guru",
    "10x",
    "unpaid",
    "unlimited overtime",
    "wear many hats",
    "work hard, play hard",
];

const NO_SPONSORSHIP: &[&str] = &[
    "no visa sponsorship",
    "unable to sponsor",
    "cannot sponsor",
    "can't sponsor",
    "not able to sponsor",
    "do not sponsor",
    "does not sponsor",
    "without sponsorship",
    "keine visa",
];

const SPONSORSHIP: &[&str] = &["visa sponsorship", "sponsorship", "visa support", "visum"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Must,
    Nice,
    Other,
}

/// Caller-supplied facts that take precedence over anything scraped.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext<'a> {
    pub job_id: &'a str,
    pub job_url: Option<&'a str>,
    pub company: Option<&'a str>,
    pub location: Option<&'a str>,
}

/// Build a [`JobIntel`] from a posting. Pure; never fails. Gaps show up as
/// `Unknown` values and red flags.
pub fn extract_job_intel(posting: &JobPosting, ctx: &ExtractionContext<'_>) -> JobIntel {
    let text = posting.full_text();
    let requirements = classify_requirements(&text, &posting.title);

    let must_keywords = condense_keywords(&requirements.must_have);
    let nice_keywords = condense_keywords(&requirements.nice_to_have);
    let keywords_for_ats = dedup_case_insensitive(must_keywords.iter().chain(&nice_keywords));

    let mut resume_focus: Vec<String> = must_keywords.iter().take(MAX_FOCUS).cloned().collect();
    if resume_focus.is_empty() {
        resume_focus = requirements.must_have.iter().take(MAX_FOCUS).cloned().collect();
    }
    let angles: Vec<String> = requirements
        .must_have
        .iter()
        .take(MAX_ANGLES)
        .cloned()
        .collect();

    let mut tailoring_guidance = BTreeMap::new();
    tailoring_guidance.insert(RESUME_FOCUS.to_string(), resume_focus);
    tailoring_guidance.insert(COVER_LETTER_ANGLES.to_string(), angles);

    let title = posting.title.trim().to_string();
    let lower = text.to_lowercase();

    let city = ctx
        .location
        .map(str::to_string)
        .or_else(|| non_empty(&posting.location));
    let company = ctx
        .company
        .map(str::to_string)
        .or_else(|| non_empty(&posting.company));

    let location = JobLocation {
        city,
        remote_policy: detect_remote_policy(&lower).to_string(),
        visa_sponsorship: detect_visa_sponsorship(&lower).to_string(),
    };

    let red_flags = collect_red_flags(&requirements, &location, &lower);

    debug!(
        "Extracted {} must-have, {} nice-to-have, {} keywords for {}",
        requirements.must_have.len(),
        requirements.nice_to_have.len(),
        keywords_for_ats.len(),
        ctx.job_id
    );

    JobIntel {
        job_id: ctx.job_id.to_string(),
        source: JobSource {
            job_url: ctx.job_url.map(str::to_string),
            language: detect_language(&text).to_string(),
        },
        role: Role {
            level: detect_level(&title).to_string(),
            employment_type: detect_employment_type(&lower).to_string(),
            title,
        },
        company: Company { name: company },
        location,
        requirements,
        keywords_for_ats,
        tailoring_guidance,
        red_flags,
    }
}

// ===== Requirement classification =====

/// `title` is the posting's role title; a leading line equal to it is never
/// read as a section header ("Requirements Engineer").
fn classify_requirements(text: &str, title: &str) -> Requirements {
    let mut must_have = Vec::new();
    let mut nice_to_have = Vec::new();
    let mut section: Option<Class> = None;
    // A plain line after a section's bullet list closes the section.
    let mut section_has_bullets = false;
    let title = title.trim();
    let mut first_line = true;

    for raw_line in text.lines() {
        let (line, is_bullet) = strip_bullet(raw_line.trim());
        if line.is_empty() {
            continue;
        }
        let is_title = first_line && !title.is_empty() && line == title && !line.ends_with(':');
        first_line = false;
        if is_bullet {
            section_has_bullets = section.is_some();
        } else if section_has_bullets {
            section = None;
            section_has_bullets = false;
        }

        for segment in split_sentences(line) {
            // Bare section header, with or without a trailing colon.
            let label = segment.trim_end_matches(':').trim();
            if !is_title && (!is_bullet || segment.ends_with(':')) && !label.contains(':') {
                if let Some(class) = header_class(label) {
                    section = Some(class);
                    section_has_bullets = false;
                    continue;
                }
            }

            // `Label: a, b, c`
            if let Some((label, rest)) = segment.split_once(':') {
                if let Some(class) = header_class(label) {
                    push_items(class, rest, &mut must_have, &mut nice_to_have);
                    continue;
                }
            }

            if let Some(class) = cue_class(&segment) {
                push_items(class, &segment, &mut must_have, &mut nice_to_have);
            } else if let Some(class) = section {
                push_items(class, &segment, &mut must_have, &mut nice_to_have);
            }
        }
    }

    Requirements {
        must_have: dedup_case_insensitive(must_have.iter()),
        nice_to_have: dedup_case_insensitive(nice_to_have.iter()),
    }
}

fn push_items(class: Class, text: &str, must: &mut Vec<String>, nice: &mut Vec<String>) {
    let target = match class {
        Class::Must => must,
        Class::Nice => nice,
        Class::Other => return,
    };
    target.extend(
        text.split([',', ';'])
            .filter_map(clean_item)
            .filter(|item| item.len() <= MAX_ITEM_LEN),
    );
}

fn strip_bullet(line: &str) -> (&str, bool) {
    for marker in ["- ", "* ", "• ", "· ", "– ", "— ", "-", "•", "·"] {
        if let Some(rest) = line.strip_prefix(marker) {
            return (rest.trim(), true);
        }
    }
    // Numbered list: `1.` or `1)`
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if rest.starts_with(' ') {
                return (rest.trim(), true);
            }
        }
    }
    (line, false)
}

/// Split on sentence-ending punctuation followed by whitespace. Periods inside
/// tokens such as `Node.js` do not split.
fn split_sentences(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        let ends = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if ends {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn header_class(label: &str) -> Option<Class> {
    let label = label.trim().to_lowercase();
    if label.is_empty() || label.split_whitespace().count() > 6 {
        return None;
    }
    let hit = |phrases: &[&str]| phrases.iter().any(|p| contains_term(&label, p));

    // Nice first: "Preferred Qualifications" is optional, not required.
    if hit(NICE_HEADERS) {
        Some(Class::Nice)
    } else if hit(OTHER_HEADERS) {
        Some(Class::Other)
    } else if hit(MUST_HEADERS) {
        Some(Class::Must)
    } else {
        None
    }
}

fn cue_class(sentence: &str) -> Option<Class> {
    if NICE_CUES.iter().any(|cue| contains_term(sentence, cue)) {
        Some(Class::Nice)
    } else if MUST_CUES.iter().any(|cue| contains_term(sentence, cue)) {
        Some(Class::Must)
    } else {
        None
    }
}

fn clean_item(raw: &str) -> Option<String> {
    let mut item = raw.trim().to_string();
    loop {
        let before = item.clone();
        item = item
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':'))
            .to_string();
        for prefix in ["and ", "or ", "& ", "und ", "oder "] {
            if item.to_lowercase().starts_with(prefix) && item.is_char_boundary(prefix.len()) {
                item = item[prefix.len()..].to_string();
            }
        }
        let lower = item.to_lowercase();
        for cue in TRAILING_CUES {
            if lower.ends_with(cue) && lower.len() > cue.len() {
                let cut = item.len() - cue.len();
                if item.is_char_boundary(cut) {
                    item.truncate(cut);
                }
                break;
            }
        }
        if item == before {
            break;
        }
    }
    if item.is_empty() {
        None
    } else {
        Some(item)
    }
}

// ===== ATS keywords =====

/// Terms that count as evidence for a requirement: the phrase itself plus
/// every keyword condensed from it. `Experience with PostgreSQL and Docker`
/// yields the phrase, `PostgreSQL` and `Docker`.
pub fn requirement_terms(requirement: &str) -> Vec<String> {
    let mut terms = vec![requirement.trim().to_string()];
    terms.extend(
        split_alternatives(requirement)
            .iter()
            .filter_map(|part| condense_keyword(part)),
    );
    dedup_case_insensitive(terms.iter())
}

/// Condense requirement items into short keywords: `5+ years Rust required`
/// becomes `Rust`, `Go or Rust` becomes `Go` and `Rust`.
fn condense_keywords(items: &[String]) -> Vec<String> {
    let mut keywords = Vec::new();
    for item in items {
        for part in split_alternatives(item) {
            if let Some(keyword) = condense_keyword(&part) {
                keywords.push(keyword);
            }
        }
    }
    dedup_case_insensitive(keywords.iter())
}

fn split_alternatives(item: &str) -> Vec<String> {
    let mut parts = vec![item.to_string()];
    for sep in [" or ", " and ", " / ", " & ", " oder ", " und "] {
        parts = parts
            .iter()
            .flat_map(|p| p.split(sep).map(str::to_string).collect::<Vec<_>>())
            .collect();
    }
    parts
}

fn condense_keyword(part: &str) -> Option<String> {
    let tokens: Vec<&str> = part
        .split_whitespace()
        .map(|t| t.trim_start_matches('(').trim_end_matches([')', ',', '.', ':', ';']))
        .filter(|t| !t.is_empty())
        .filter(|t| !FILLER_WORDS.contains(&t.to_lowercase().as_str()))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-')))
        .collect();

    if tokens.is_empty() || tokens.len() > MAX_KEYWORD_WORDS {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn dedup_case_insensitive<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(item.to_lowercase()))
        .cloned()
        .collect()
}

// ===== Role & location signals =====

fn detect_language(text: &str) -> &'static str {
    let mut german = 0usize;
    let mut english = 0usize;
    for word in text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if GERMAN_MARKERS.contains(&word.as_str()) {
            german += 1;
        }
        if ENGLISH_MARKERS.contains(&word.as_str()) {
            english += 1;
        }
    }
    if german > english {
        "de"
    } else {
        "en"
    }
}

fn detect_level(title: &str) -> &'static str {
    // Checked in precedence order: "Senior Staff Engineer" is staff.
    const LEVELS: &[(&str, &str)] = &[
        ("principal", "principal"),
        ("staff", "staff"),
        ("head", "head"),
        ("director", "head"),
        ("lead", "lead"),
        ("senior", "senior"),
        ("sr", "senior"),
        ("mid", "mid"),
        ("mid-level", "mid"),
        ("intermediate", "mid"),
        ("junior", "junior"),
        ("jr", "junior"),
        ("intern", "intern"),
        ("internship", "intern"),
        ("praktikant", "intern"),
        ("werkstudent", "intern"),
    ];
    LEVELS
        .iter()
        .find(|(word, _)| contains_term(title, word))
        .map(|(_, level)| *level)
        .unwrap_or("Unknown")
}

fn detect_employment_type(lower: &str) -> &'static str {
    const TYPES: &[(&str, &str)] = &[
        ("full-time", "full-time"),
        ("full time", "full-time"),
        ("fulltime", "full-time"),
        ("vollzeit", "full-time"),
        ("part-time", "part-time"),
        ("part time", "part-time"),
        ("teilzeit", "part-time"),
        ("working student", "working student"),
        ("werkstudent", "working student"),
        ("internship", "internship"),
        ("praktikum", "internship"),
        ("contract", "contract"),
        ("freelance", "contract"),
        ("freiberuflich", "contract"),
    ];
    TYPES
        .iter()
        .find(|(cue, _)| contains_term(lower, cue))
        .map(|(_, kind)| *kind)
        .unwrap_or("Unknown")
}

fn detect_remote_policy(lower: &str) -> &'static str {
    if contains_term(lower, "hybrid") {
        "hybrid"
    } else if ["fully remote", "remote-first", "remote"]
        .iter()
        .any(|c| contains_term(lower, c))
    {
        "remote"
    } else if ["on-site", "onsite", "on site", "vor ort"]
        .iter()
        .any(|c| contains_term(lower, c))
    {
        "on-site"
    } else {
        "Unknown"
    }
}

fn detect_visa_sponsorship(lower: &str) -> &'static str {
    if NO_SPONSORSHIP.iter().any(|c| lower.contains(c)) {
        "No"
    } else if SPONSORSHIP.iter().any(|c| contains_term(lower, c)) {
        "Yes"
    } else {
        "Unknown"
    }
}

fn collect_red_flags(requirements: &Requirements, location: &JobLocation, lower: &str) -> Vec<String> {
    let mut flags = Vec::new();
    if requirements.must_have.is_empty() {
        flags.push("No explicit must-have requirements found".to_string());
    }
    if requirements.must_have.len() > LONG_MUST_HAVE_LIST {
        flags.push(format!(
            "Unusually long must-have list ({} items)",
            requirements.must_have.len()
        ));
    }
    if location.visa_sponsorship == "Unknown" {
        flags.push("Visa sponsorship not mentioned".to_string());
    }
    for word in BUZZWORDS {
        if lower.contains(word) {
            flags.push(format!("Buzzword in posting: \"{}\"", word));
        }
    }
    flags
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
