//! Whitespace normalization applied to every extracted document, whatever its source format.

use serde::Serialize;

/// Normalizes raw extracted text.
///
/// Every line is trimmed and blank lines are dropped, then the remaining lines are
/// joined with single newlines. Runs of three or more newlines are collapsed to two
/// until none remain, so the output never holds more than one blank line in a row.
pub fn normalize(raw: &str) -> String {
    let joined = raw
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    collapse_blank_runs(joined)
}

fn collapse_blank_runs(mut text: String) -> String {
    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }
    text
}

/// Basic size statistics for a piece of text, shown next to extracted and generated content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
            lines: text.split('\n').count(),
        }
    }
}
