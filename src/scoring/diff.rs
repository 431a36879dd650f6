// src/scoring/diff.rs
//! Line diff between two resume texts.
//!
//! Lines keep their terminator (`split_inclusive('\n')`), so a text without a
//! trailing newline diffs and replays exactly.

use anyhow::{bail, Result};

use crate::types::score::DiffOp;

/// Context lines around each hunk of [`render_unified`].
pub const UNIFIED_CONTEXT: usize = 3;

/// Longest-common-subsequence line diff of `base` into `tailored`.
pub fn diff_lines(base: &str, tailored: &str) -> Vec<DiffOp> {
    let a: Vec<&str> = base.split_inclusive('\n').collect();
    let b: Vec<&str> = tailored.split_inclusive('\n').collect();

    // Shared head and tail never enter the table.
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut ops: Vec<DiffOp> = a[..prefix]
        .iter()
        .map(|l| DiffOp::Equal(l.to_string()))
        .collect();
    ops.extend(lcs_ops(a_mid, b_mid));
    ops.extend(
        a[a.len() - suffix..]
            .iter()
            .map(|l| DiffOp::Equal(l.to_string())),
    );
    ops
}

fn lcs_ops(a: &[&str], b: &[&str]) -> Vec<DiffOp> {
    let (n, m) = (a.len(), b.len());
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            ops.push(DiffOp::Equal(a[i].to_string()));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            ops.push(DiffOp::Delete(a[i].to_string()));
            i += 1;
        } else {
            ops.push(DiffOp::Insert(b[j].to_string()));
            j += 1;
        }
    }
    ops.extend(a[i..].iter().map(|l| DiffOp::Delete(l.to_string())));
    ops.extend(b[j..].iter().map(|l| DiffOp::Insert(l.to_string())));
    ops
}

/// Replay `ops` against `base`. Fails if an equal or delete line does not
/// match the base text at that position.
pub fn apply_diff(base: &str, ops: &[DiffOp]) -> Result<String> {
    let mut lines = base.split_inclusive('\n');
    let mut out = String::with_capacity(base.len());

    for (index, op) in ops.iter().enumerate() {
        match op {
            DiffOp::Insert(line) => out.push_str(line),
            DiffOp::Equal(line) | DiffOp::Delete(line) => {
                match lines.next() {
                    Some(current) if current == line => {}
                    Some(current) => bail!(
                        "diff op {} expects {:?} but base has {:?}",
                        index,
                        line,
                        current
                    ),
                    None => bail!("diff op {} runs past the end of the base text", index),
                }
                if let DiffOp::Equal(line) = op {
                    out.push_str(line);
                }
            }
        }
    }

    if lines.next().is_some() {
        bail!("diff does not cover the whole base text");
    }
    Ok(out)
}

/// Inserted plus deleted lines.
pub fn diff_size(ops: &[DiffOp]) -> usize {
    ops.iter().filter(|op| op.is_change()).count()
}

/// Render `ops` as a unified diff with `context` lines around each change.
/// Returns an empty string when nothing changed.
pub fn render_unified(ops: &[DiffOp], from_name: &str, to_name: &str, context: usize) -> String {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.is_change())
        .map(|(i, _)| i)
        .collect();
    if changes.is_empty() {
        return String::new();
    }

    // Line numbers in base and tailored before each op.
    let mut positions = Vec::with_capacity(ops.len() + 1);
    let (mut a_pos, mut b_pos) = (0usize, 0usize);
    for op in ops {
        positions.push((a_pos, b_pos));
        match op {
            DiffOp::Equal(_) => {
                a_pos += 1;
                b_pos += 1;
            }
            DiffOp::Delete(_) => a_pos += 1,
            DiffOp::Insert(_) => b_pos += 1,
        }
    }
    positions.push((a_pos, b_pos));

    // Changes separated by at most 2 * context equal lines share a hunk.
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &change in &changes {
        match hunks.last_mut() {
            Some((_, last)) if change - *last <= 2 * context + 1 => *last = change,
            _ => hunks.push((change, change)),
        }
    }

    let mut out = format!("--- {}\n+++ {}\n", from_name, to_name);
    for (first, last) in hunks {
        let start = first.saturating_sub(context);
        let end = (last + 1 + context).min(ops.len());
        let (a_start, b_start) = positions[start];
        let (a_end, b_end) = positions[end];

        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(a_start, a_end),
            format_range(b_start, b_end)
        ));
        for op in &ops[start..end] {
            let marker = match op {
                DiffOp::Equal(_) => ' ',
                DiffOp::Delete(_) => '-',
                DiffOp::Insert(_) => '+',
            };
            out.push(marker);
            out.push_str(op.line());
            if !op.line().ends_with('\n') {
                out.push_str("\n\\ No newline at end of file\n");
            }
        }
    }
    out
}

fn format_range(start: usize, end: usize) -> String {
    let length = end - start;
    match length {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_replays_exactly() {
        let base = "a\nb\nc\nd\n";
        let tailored = "% header\na\nc\nd\ne";
        let ops = diff_lines(base, tailored);
        assert_eq!(apply_diff(base, &ops).unwrap(), tailored);
        assert_eq!(diff_size(&ops), 3);
    }

    #[test]
    fn test_identical_texts_have_no_changes() {
        let text = "\\section{Skills}\nPython, SQL\n";
        let ops = diff_lines(text, text);
        assert_eq!(diff_size(&ops), 0);
        assert!(ops.iter().all(|op| matches!(op, DiffOp::Equal(_))));
        assert_eq!(render_unified(&ops, "a", "b", UNIFIED_CONTEXT), "");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(diff_lines("", "").is_empty());
        let ops = diff_lines("", "new\n");
        assert_eq!(ops, vec![DiffOp::Insert("new\n".to_string())]);
        assert_eq!(apply_diff("", &ops).unwrap(), "new\n");
    }

    #[test]
    fn test_apply_rejects_mismatched_base() {
        let ops = diff_lines("a\nb\n", "a\nc\n");
        assert!(apply_diff("x\nb\n", &ops).is_err());
        assert!(apply_diff("a\nb\nextra\n", &ops).is_err());
    }

    #[test]
    fn test_unified_single_change() {
        let base = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let tailored = "1\n2\n3\n4\nfive\n6\n7\n8\n9\n";
        let ops = diff_lines(base, tailored);
        let unified = render_unified(&ops, "base.tex", "resume.tex", UNIFIED_CONTEXT);
        assert_eq!(
            unified,
            "--- base.tex\n+++ resume.tex\n@@ -2,7 +2,7 @@\n 2\n 3\n 4\n-5\n+five\n 6\n 7\n 8\n"
        );
    }

    #[test]
    fn test_unified_splits_distant_hunks() {
        let base: String = (1..=20).map(|i| format!("{}\n", i)).collect();
        let tailored: String = (1..=20)
            .map(|i| match i {
                2 => "two\n".to_string(),
                19 => "nineteen\n".to_string(),
                _ => format!("{}\n", i),
            })
            .collect();
        let ops = diff_lines(&base, &tailored);
        let unified = render_unified(&ops, "a", "b", UNIFIED_CONTEXT);
        assert_eq!(unified.matches("@@ -").count(), 2);
        assert!(unified.contains("@@ -1,5 +1,5 @@\n"));
        assert!(unified.contains("@@ -16,5 +16,5 @@\n"));
    }

    #[test]
    fn test_unified_insert_into_empty() {
        let ops = diff_lines("", "only\n");
        let unified = render_unified(&ops, "a", "b", UNIFIED_CONTEXT);
        assert!(unified.contains("@@ -0,0 +1 @@\n+only\n"));
    }
}
