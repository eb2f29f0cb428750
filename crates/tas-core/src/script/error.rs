//! Diagnostics produced while parsing a TAS script.
//!
//! Two kinds exist:
//!
//! - [`ScriptError`] – fatal.  The first one encountered stops the pipeline
//!   and no payload is produced.
//! - [`SyntaxWarning`] – non-fatal.  An unrecognized header line is logged and
//!   skipped; parsing continues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::script::header::HeaderKey;

/// Fatal errors that abort script compilation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    /// A mandatory header key never appeared before the sentinel line.
    #[error("missing required header field '{field}'")]
    MissingField { field: HeaderKey },

    /// A header value failed type conversion, a range check, or catalog
    /// membership.
    #[error("invalid value '{value}' for header field '{field}': expected {expected}")]
    InvalidValue {
        field: HeaderKey,
        value: String,
        expected: String,
    },

    /// No line equal to the header/framebulk boundary keyword was found.
    #[error("no '{sentinel}' line found; cannot tell where the header ends")]
    SentinelNotFound { sentinel: String },

    /// A framebulk line could not be parsed.  `line` is the 1-based line
    /// number in the original file, not in the filtered stream.
    #[error("framebulk syntax error on line {line}: {reason}")]
    FramebulkSyntax { line: usize, reason: String },
}

impl ScriptError {
    /// Returns the original source line number for errors tied to one line.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::FramebulkSyntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// A header line that matched no recognized key pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxWarning {
    /// 1-based line number in the original file.
    pub line: usize,
    /// The normalized text of the skipped line.
    pub text: String,
}

impl std::fmt::Display for SyntaxWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: unrecognized header line '{}', skipping", self.line, self.text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
