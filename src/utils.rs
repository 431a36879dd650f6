// src/utils.rs
use std::path::{Component, Path, PathBuf};

/// Longest folder slug produced by [`sanitize_folder_name`].
pub const MAX_SLUG_LEN: usize = 80;

/// Normalize a job title into a folder-safe slug.
///
/// Lowercases, maps everything outside `[a-z0-9_-]` to `_`, collapses runs of
/// separators and trims them from both ends.
pub fn sanitize_folder_name(title: &str) -> String {
    let mapped: String = title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut slug = String::with_capacity(mapped.len());
    let mut last: Option<char> = None;
    for c in mapped.chars() {
        let is_sep = c == '_' || c == '-';
        if is_sep && matches!(last, Some('_') | Some('-')) {
            continue;
        }
        slug.push(c);
        last = Some(c);
    }

    let slug = slug.trim_matches(|c| c == '_' || c == '-');
    let slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches(|c| c == '_' || c == '-');

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Folder-safe form of a job id. Case is kept; anything outside
/// `[A-Za-z0-9_-]` (path separators and dots included) becomes `_`.
pub fn sanitize_job_id(job_id: &str) -> String {
    let id: String = job_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SLUG_LEN)
        .collect();
    if id.trim_matches('_').is_empty() {
        "job".to_string()
    } else {
        id
    }
}

/// `<job_id>_<sanitized_title>`
pub fn job_folder_name(job_id: &str, title: &str) -> String {
    format!("{}_{}", sanitize_job_id(job_id), sanitize_folder_name(title))
}

/// Normalize language code
pub fn normalize_language(lang: Option<&str>) -> String {
    match lang.map(|s| s.to_lowercase()).as_deref() {
        Some("de") | Some("german") | Some("deutsch") => "de".to_string(),
        _ => "en".to_string(),
    }
}

/// Case-insensitive search for `needle` in `haystack` that only accepts hits
/// bounded by non-alphanumeric characters, so `Go` does not match `Google`.
pub fn contains_term(haystack: &str, needle: &str) -> bool {
    find_term(haystack, needle).is_some()
}

/// Byte offset (into the lowercased haystack) of the first bounded hit.
pub fn find_term(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let hay = haystack.to_lowercase();

    let mut from = 0;
    while let Some(rel) = hay[from..].find(&needle) {
        let start = from + rel;
        let end = start + needle.len();
        let before_ok = hay[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = hay[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(start);
        }
        from = start + hay[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// `text` without its full-line LaTeX comments, so annotations never count as
/// resume content.
pub fn strip_latex_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.trim_start().starts_with('%'))
        .collect()
}

/// Resolve a possibly relative path against the current directory.
pub fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Lexically resolve `.` and `..` components without touching the disk.
/// `..` never climbs above the root of an absolute path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Treat empty and whitespace-only strings as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
