// src/latex.rs
//! Cheap structural checks on LaTeX source.
//!
//! Not a parser: comments and escaped braces are skipped, everything else is
//! counted. Enough to tell whether an edit broke a document that compiled.

use serde::{Deserialize, Serialize};

pub const CHECK_BALANCED_BRACES: &str = "balanced_braces";
pub const CHECK_MATCHED_ENVIRONMENTS: &str = "matched_environments";
pub const CHECK_DOCUMENTCLASS: &str = "has_documentclass";
pub const CHECK_END_DOCUMENT: &str = "has_end_document";

/// Outcome of one structural check on the base and the tailored text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityCheck {
    pub check: String,
    pub base_passed: bool,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SanityCheck {
    /// The tailored text fails a check the base text passed.
    pub fn regressed(&self) -> bool {
        self.base_passed && !self.passed
    }
}

/// Run every check on both texts.
pub fn compare_structure(base: &str, tailored: &str) -> Vec<SanityCheck> {
    let base_results = run_checks(base);
    run_checks(tailored)
        .into_iter()
        .zip(base_results)
        .map(|((check, tailored_result), (_, base_result))| SanityCheck {
            check: check.to_string(),
            base_passed: base_result.is_ok(),
            passed: tailored_result.is_ok(),
            detail: tailored_result.err(),
        })
        .collect()
}

fn run_checks(text: &str) -> Vec<(&'static str, Result<(), String>)> {
    let code = strip_comments(text);
    vec![
        (CHECK_BALANCED_BRACES, check_braces(&code)),
        (CHECK_MATCHED_ENVIRONMENTS, check_environments(&code)),
        (CHECK_DOCUMENTCLASS, require(&code, "\\documentclass")),
        (CHECK_END_DOCUMENT, require(&code, "\\end{document}")),
    ]
}

fn require(code: &str, command: &str) -> Result<(), String> {
    if code.contains(command) {
        Ok(())
    } else {
        Err(format!("missing {}", command))
    }
}

/// Text with `%` comments removed; `\%` is kept.
pub fn strip_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            let code = line_code(line);
            if code.len() < line.len() && line.ends_with('\n') {
                format!("{}\n", code)
            } else {
                code.to_string()
            }
        })
        .collect()
}

/// The part of `line` before an unescaped `%`.
pub(crate) fn line_code(line: &str) -> &str {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '%' if !escaped => return &line[..i],
            _ => escaped = false,
        }
    }
    line
}

/// Walk `code` calling `on_char(offset, char, depth after char)`, ignoring
/// `\{` and `\}`. Returns the final depth, or the byte offset where depth
/// first goes negative.
fn brace_walk(code: &str, mut on_char: impl FnMut(usize, char, i64)) -> Result<i64, usize> {
    let mut depth: i64 = 0;
    let mut escaped = false;
    for (i, c) in code.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '{' if !escaped => depth += 1,
            '}' if !escaped => {
                depth -= 1;
                if depth < 0 {
                    return Err(i);
                }
            }
            _ => {}
        }
        if c != '\\' {
            escaped = false;
        }
        on_char(i, c, depth);
    }
    Ok(depth)
}

fn check_braces(code: &str) -> Result<(), String> {
    match brace_walk(code, |_, _, _| {}) {
        Ok(0) => Ok(()),
        Ok(open) => Err(format!("{} unclosed `{{`", open)),
        Err(offset) => Err(format!("unmatched `}}` at byte {}", offset)),
    }
}

fn check_environments(code: &str) -> Result<(), String> {
    let mut stack: Vec<&str> = Vec::new();
    let mut rest = code;
    while let Some(pos) = rest.find('\\') {
        rest = &rest[pos + 1..];
        let (is_begin, after) = if let Some(after) = rest.strip_prefix("begin{") {
            (true, after)
        } else if let Some(after) = rest.strip_prefix("end{") {
            (false, after)
        } else {
            continue;
        };
        let Some(close) = after.find('}') else {
            return Err("unterminated environment name".to_string());
        };
        let name = &after[..close];
        if is_begin {
            stack.push(name);
        } else {
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => return Err(format!("\\end{{{}}} closes \\begin{{{}}}", name, open)),
                None => return Err(format!("\\end{{{}}} without \\begin", name)),
            }
        }
        rest = &after[close + 1..];
    }
    match stack.last() {
        None => Ok(()),
        Some(open) => Err(format!("\\begin{{{}}} is never closed", open)),
    }
}

/// Split `list` on `sep` at brace depth 0. `None` when the braces in `list`
/// are not balanced on their own.
pub fn split_top_level(list: &str, sep: char) -> Option<Vec<&str>> {
    let mut cuts = Vec::new();
    let depth = brace_walk(list, |i, c, depth| {
        if c == sep && depth == 0 {
            cuts.push(i);
        }
    })
    .ok()?;
    if depth != 0 {
        return None;
    }

    let mut items = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        items.push(&list[start..cut]);
        start = cut + sep.len_utf8();
    }
    items.push(&list[start..]);
    Some(items)
}

/// Byte offset of the first `target` at brace depth 0.
pub fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut found = None;
    let _ = brace_walk(text, |i, c, depth| {
        if found.is_none() && c == target && depth == 0 {
            found = Some(i);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\\documentclass{article}\n\\begin{document}\n\\begin{itemize}\n\\item Python 50\\% faster % {comment\n\\end{itemize}\n\\end{document}\n";

    #[test]
    fn test_well_formed_document_passes() {
        let checks = compare_structure(DOC, DOC);
        assert_eq!(checks.len(), 4);
        assert!(checks.iter().all(|c| c.passed && c.base_passed));
        assert!(checks.iter().all(|c| !c.regressed()));
    }

    #[test]
    fn test_misplaced_brace_regresses() {
        let broken = DOC.replace("\\item Python", "\\item Python}");
        let checks = compare_structure(DOC, &broken);
        let braces = checks.iter().find(|c| c.check == CHECK_BALANCED_BRACES).unwrap();
        assert!(braces.regressed());
        assert!(braces.detail.as_deref().unwrap().contains("unmatched"));
    }

    #[test]
    fn test_environment_mismatch() {
        let broken = DOC.replace("\\end{itemize}\n", "");
        let checks = compare_structure(DOC, &broken);
        let envs = checks.iter().find(|c| c.check == CHECK_MATCHED_ENVIRONMENTS).unwrap();
        assert!(envs.regressed());
    }

    #[test]
    fn test_fragment_without_preamble_is_not_a_regression() {
        let fragment = "Skills: Python, SQL\n";
        let checks = compare_structure(fragment, fragment);
        let class = checks.iter().find(|c| c.check == CHECK_DOCUMENTCLASS).unwrap();
        assert!(!class.base_passed && !class.passed);
        assert!(!class.regressed());
    }

    #[test]
    fn test_strip_comments_keeps_escaped_percent() {
        assert_eq!(strip_comments("a 50\\% b % note\nc\n"), "a 50\\% b \nc\n");
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level(" \\textit{Rust, Go}, Python", ','),
            Some(vec![" \\textit{Rust, Go}", " Python"])
        );
        assert_eq!(split_top_level("a, \\{b, c", ','), Some(vec!["a", " \\{b", " c"]));
        assert_eq!(split_top_level(" Go}, \\textit{Rust", ','), None);
        assert_eq!(split_top_level(" \\textit{Rust, Go", ','), None);
    }

    #[test]
    fn test_find_top_level() {
        assert_eq!(find_top_level("\\href{https://x}: a", ':'), Some(16));
        assert_eq!(find_top_level("\\href{https://x}", ':'), None);
    }
}
