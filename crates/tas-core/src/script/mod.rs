//! TAS script text format: normalization, header, and framebulks.

pub mod catalog;
pub mod error;
pub mod framebulk;
pub mod header;
pub mod normalize;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::script::error::{ScriptError, SyntaxWarning};
use crate::script::framebulk::{parse_framebulks, Framebulk};
use crate::script::header::{scan_header, RaceHeader};
use crate::script::normalize::{normalize_source, ScriptLine};

/// Default keyword separating the header from the framebulk section.
pub const DEFAULT_HEADER_END: &str = "framebulks";

/// Options controlling how a script is split and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOptions {
    /// Keyword of the line that ends the header.  Compared against the
    /// normalized (lowercase) line text, so it is lowercased on use.
    pub header_end: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            header_end: DEFAULT_HEADER_END.to_string(),
        }
    }
}

/// A fully parsed script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasScript {
    pub header: RaceHeader,
    pub framebulks: Vec<Framebulk>,
    /// Unrecognized header lines that were skipped.
    pub warnings: Vec<SyntaxWarning>,
}

/// Splits normalized lines at the first line equal to `sentinel`.
///
/// Returns `(header_lines, framebulk_lines)`; the sentinel line itself is in
/// neither half.
///
/// # Errors
///
/// [`ScriptError::SentinelNotFound`] when no line equals `sentinel`.
pub fn split_sections<'a>(
    lines: &'a [ScriptLine],
    sentinel: &str,
) -> Result<(&'a [ScriptLine], &'a [ScriptLine]), ScriptError> {
    let sentinel = sentinel.trim().to_lowercase();
    let idx = lines
        .iter()
        .position(|l| l.text == sentinel)
        .ok_or_else(|| ScriptError::SentinelNotFound {
            sentinel: sentinel.clone(),
        })?;
    debug!("header ends at line {}", lines[idx].line_number);
    Ok((&lines[..idx], &lines[idx + 1..]))
}

/// Parses the text of a whole script.
///
/// # Errors
///
/// Returns the first fatal [`ScriptError`], scanning header lines before
/// framebulk lines.
pub fn parse_script(source: &str, options: &ScriptOptions) -> Result<TasScript, ScriptError> {
    let lines = normalize_source(source);
    let (header_lines, framebulk_lines) = split_sections(&lines, &options.header_end)?;

    let (raw, warnings) = scan_header(header_lines);
    let header = RaceHeader::validate(&raw)?;
    let framebulks = parse_framebulks(framebulk_lines)?;

    info!(
        "parsed script: map={}, kart={}, {} framebulks, {} warnings",
        header.map,
        header.kart_name,
        framebulks.len(),
        warnings.len()
    );

    Ok(TasScript {
        header,
        framebulks,
        warnings,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
