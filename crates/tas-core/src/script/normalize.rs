//! Line normalizer: turns raw script text into comparable lines.
//!
//! For each raw line:
//!
//! 1. Everything at and after the first `//` is removed.
//! 2. Runs of whitespace collapse to a single space.
//! 3. Leading and trailing whitespace is trimmed.
//! 4. The result is lowercased.
//! 5. Lines that end up empty are dropped.
//!
//! Surviving lines keep their **original** 1-based line number so that every
//! later diagnostic points at the source file rather than the filtered stream.

use serde::{Deserialize, Serialize};

/// Marker that starts a comment running to end of line.
pub const COMMENT_MARKER: &str = "//";

/// One normalized, non-empty line of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    /// 1-based line number in the original file.
    pub line_number: usize,
    /// Normalized text (comment-free, single-spaced, trimmed, lowercase).
    pub text: String,
}

impl ScriptLine {
    pub fn new(line_number: usize, text: impl Into<String>) -> Self {
        Self {
            line_number,
            text: text.into(),
        }
    }
}

/// Normalizes a single raw line.  Returns an empty string for lines that
/// should be discarded.
///
/// # Examples
///
/// ```rust
/// use tas_core::script::normalize::normalize_line;
///
/// assert_eq!(normalize_line("  MAP   =  Abyss  // the first track"), "map = abyss");
/// assert_eq!(normalize_line("// only a comment"), "");
/// ```
pub fn normalize_line(raw: &str) -> String {
    let code = match raw.find(COMMENT_MARKER) {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    // `split_whitespace` already skips leading/trailing runs, so joining on a
    // single space both collapses and trims.
    code.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalizes every line of `source`, dropping the ones that become empty.
pub fn normalize_source(source: &str) -> Vec<ScriptLine> {
    normalize_lines(source.lines())
}

/// Same as [`normalize_source`] for callers that already hold split lines.
pub fn normalize_lines<'a, I>(lines: I) -> Vec<ScriptLine>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = normalize_line(raw);
            if text.is_empty() {
                None
            } else {
                Some(ScriptLine::new(idx + 1, text))
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
