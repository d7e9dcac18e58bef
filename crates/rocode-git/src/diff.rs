//! Unified-diff hunk extraction.

use once_cell::sync::Lazy;
use regex::Regex;

static HUNK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub new_start: u32,
    pub new_len: u32,
    /// Header line plus body, newline-joined.
    pub text: String,
}

impl Hunk {
    /// Whether `line` falls inside the hunk's new-file range. A zero-length
    /// range (pure deletion) still claims its start line.
    pub fn contains(&self, line: u32) -> bool {
        let end = self.new_start.saturating_add(self.new_len.max(1));
        line >= self.new_start && line < end
    }
}

/// Parse `@@ -a,b +c,d @@` into `(new_start, new_len)`.
pub fn parse_hunk_header(line: &str) -> Option<(u32, u32)> {
    let caps = HUNK_HEADER.captures(line)?;
    let start = caps.get(3)?.as_str().parse().ok()?;
    let len = caps
        .get(4)
        .map(|m| m.as_str().parse().unwrap_or(1))
        .unwrap_or(1);
    Some((start, len))
}

pub fn parse_hunks(diff: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<(u32, u32, Vec<&str>)> = None;

    for line in diff.lines() {
        if let Some((start, len)) = parse_hunk_header(line) {
            if let Some((s, l, body)) = current.take() {
                hunks.push(Hunk {
                    new_start: s,
                    new_len: l,
                    text: body.join("\n"),
                });
            }
            current = Some((start, len, vec![line]));
            continue;
        }
        if line.starts_with("diff --git ") {
            if let Some((s, l, body)) = current.take() {
                hunks.push(Hunk {
                    new_start: s,
                    new_len: l,
                    text: body.join("\n"),
                });
            }
            continue;
        }
        if let Some((_, _, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((s, l, body)) = current {
        hunks.push(Hunk {
            new_start: s,
            new_len: l,
            text: body.join("\n"),
        });
    }
    hunks
}

/// Return the hunk whose new-file range contains `line`, or the whole diff
/// when no line is given or no hunk matches.
pub fn extract_hunk(diff: &str, line: Option<u32>) -> String {
    let Some(line) = line else {
        return diff.to_string();
    };
    parse_hunks(diff)
        .into_iter()
        .find(|hunk| hunk.contains(line))
        .map(|hunk| hunk.text)
        .unwrap_or_else(|| diff.to_string())
}
