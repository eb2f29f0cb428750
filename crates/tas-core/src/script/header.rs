//! Header parser: race configuration preceding the framebulk section.
//!
//! Parsing happens in two steps so that values are only ever handed out in a
//! fully-typed form:
//!
//! 1. [`scan_header`] recognizes `key <sep> value` lines and collects the raw
//!    string values into a [`RawHeader`].  Lines that match no key become
//!    [`SyntaxWarning`]s.  A key that appears twice keeps its last value.
//! 2. [`RaceHeader::validate`] converts and checks every field in a fixed
//!    order and returns the first failure.
//!
//! # Line grammar
//!
//! ```text
//! key ( ' ' | ':' | '=' ) [quote] value [same quote]
//! ```
//!
//! Whitespace may surround `:` and `=`.  A quote, if present, must be `'` or
//! `"` and must be closed by the same character; the quotes are stripped
//! before storage.  An unquoted value is a single token.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::script::catalog::{describe_choices, is_known_kart, is_known_map, ALLOWED_KARTS, ALLOWED_MAPS};
use crate::script::error::{ScriptError, SyntaxWarning};
use crate::script::normalize::ScriptLine;

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Every recognized header key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderKey {
    Map,
    KartName,
    NumLaps,
    Difficulty,
    NumAiKarts,
    QuickReset,
}

impl HeaderKey {
    /// All keys, in the order they are tried against a line.
    pub const ALL: [HeaderKey; 6] = [
        HeaderKey::Map,
        HeaderKey::KartName,
        HeaderKey::NumLaps,
        HeaderKey::Difficulty,
        HeaderKey::NumAiKarts,
        HeaderKey::QuickReset,
    ];

    /// Keys that must be present for a header to be valid, in reporting order.
    pub const REQUIRED: [HeaderKey; 4] = [
        HeaderKey::Map,
        HeaderKey::KartName,
        HeaderKey::NumLaps,
        HeaderKey::Difficulty,
    ];

    /// The keyword as written in a script.
    pub fn as_str(self) -> &'static str {
        match self {
            HeaderKey::Map => "map",
            HeaderKey::KartName => "kart_name",
            HeaderKey::NumLaps => "num_laps",
            HeaderKey::Difficulty => "difficulty",
            HeaderKey::NumAiKarts => "num_ai_karts",
            HeaderKey::QuickReset => "quick_reset",
        }
    }

    /// Value used when an optional key is absent.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            HeaderKey::NumAiKarts => Some("0"),
            HeaderKey::QuickReset => Some("false"),
            _ => None,
        }
    }
}

impl std::fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Line matching ─────────────────────────────────────────────────────────────

/// Matches one normalized header line against every key pattern.
///
/// Returns the key and the unquoted value, or `None` if no pattern matches.
///
/// # Examples
///
/// ```rust
/// use tas_core::script::header::{match_header_line, HeaderKey};
///
/// assert_eq!(
///     match_header_line("kart_name: \"tux\""),
///     Some((HeaderKey::KartName, "tux".to_string()))
/// );
/// assert_eq!(match_header_line("laps = 3"), None);
/// ```
pub fn match_header_line(text: &str) -> Option<(HeaderKey, String)> {
    HeaderKey::ALL
        .iter()
        .find_map(|&key| match_key(text, key).map(|value| (key, value)))
}

fn match_key(text: &str, key: HeaderKey) -> Option<String> {
    let rest = text.strip_prefix(key.as_str())?;

    // The key must be followed by a separator, otherwise `map` would also
    // match `mapname = x`.
    let first = rest.chars().next()?;
    if !(first.is_whitespace() || first == ':' || first == '=') {
        return None;
    }

    let mut rest = rest.trim_start();
    if let Some(stripped) = rest.strip_prefix(':').or_else(|| rest.strip_prefix('=')) {
        rest = stripped.trim_start();
    }

    extract_value(rest.trim_end())
}

/// Applies the quoting rule to the value part of a header line.
fn extract_value(raw: &str) -> Option<String> {
    let first = raw.chars().next()?;
    if first == '"' || first == '\'' {
        let inner = raw.strip_prefix(first)?.strip_suffix(first)?;
        if inner.is_empty() || inner.contains(first) {
            return None;
        }
        return Some(inner.to_string());
    }

    let is_token = raw
        .chars()
        .all(|c| !c.is_whitespace() && c != '"' && c != '\'');
    if is_token {
        Some(raw.to_string())
    } else {
        None
    }
}

// ── Raw scan ──────────────────────────────────────────────────────────────────

/// String values collected from header lines before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeader {
    values: BTreeMap<HeaderKey, String>,
}

impl RawHeader {
    /// Records `value` for `key`, replacing any earlier value.
    pub fn insert(&mut self, key: HeaderKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    /// Returns the raw value for `key`, if one was seen.
    pub fn get(&self, key: HeaderKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Returns the raw value for `key`, or its default when absent.
    fn get_or_default(&self, key: HeaderKey) -> Option<&str> {
        self.get(key).or_else(|| key.default_value())
    }
}

/// Collects raw header values from `lines`.
///
/// Unrecognized lines are logged at `warn` level and returned as
/// [`SyntaxWarning`]s; they never cause a failure.
pub fn scan_header(lines: &[ScriptLine]) -> (RawHeader, Vec<SyntaxWarning>) {
    let mut raw = RawHeader::default();
    let mut warnings = Vec::new();

    for line in lines {
        match match_header_line(&line.text) {
            Some((key, value)) => {
                debug!("line {}: header {key} = {value:?}", line.line_number);
                raw.insert(key, value);
            }
            None => {
                let warning = SyntaxWarning {
                    line: line.line_number,
                    text: line.text.clone(),
                };
                warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    (raw, warnings)
}

// ── Validated header ──────────────────────────────────────────────────────────

/// Fully validated race configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceHeader {
    /// Track identifier, a member of [`ALLOWED_MAPS`].
    pub map: String,
    /// Player kart identifier, a member of [`ALLOWED_KARTS`].
    pub kart_name: String,
    /// Lap count; `-1` or a positive number.
    pub num_laps: i32,
    /// Difficulty level, `0..=3`.
    pub difficulty: i32,
    /// Number of AI opponents, `>= 0`.
    pub num_ai_karts: i32,
    /// Whether quick reset is enabled.
    pub quick_reset: bool,
}

impl RaceHeader {
    /// Converts and validates `raw`.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// presence of the required keys, `num_laps`, `difficulty`,
    /// `num_ai_karts`, `map`, `kart_name`, `quick_reset`.
    ///
    /// # Errors
    ///
    /// [`ScriptError::MissingField`] for an absent required key, otherwise
    /// [`ScriptError::InvalidValue`].
    pub fn validate(raw: &RawHeader) -> Result<Self, ScriptError> {
        if let Some(&field) = HeaderKey::REQUIRED.iter().find(|k| raw.get(**k).is_none()) {
            return Err(ScriptError::MissingField { field });
        }

        let num_laps = parse_int(raw, HeaderKey::NumLaps, |n| n == -1 || n > 0, "-1 or a positive integer")?;
        let difficulty = parse_int(raw, HeaderKey::Difficulty, |n| (0..=3).contains(&n), "an integer from 0 to 3")?;
        let num_ai_karts = parse_int(raw, HeaderKey::NumAiKarts, |n| n >= 0, "a non-negative integer")?;
        let map = parse_choice(raw, HeaderKey::Map, is_known_map, ALLOWED_MAPS)?;
        let kart_name = parse_choice(raw, HeaderKey::KartName, is_known_kart, ALLOWED_KARTS)?;
        let quick_reset = parse_bool(raw, HeaderKey::QuickReset)?;

        Ok(RaceHeader {
            map,
            kart_name,
            num_laps,
            difficulty,
            num_ai_karts,
            quick_reset,
        })
    }
}

/// Parses and validates the header section.
///
/// `lines` must be the normalized lines before the sentinel.  Warnings for
/// unrecognized lines are logged and discarded; use [`scan_header`] directly
/// to keep them.
///
/// # Errors
///
/// Returns the first [`ScriptError`] produced by [`RaceHeader::validate`].
pub fn parse_header(lines: &[ScriptLine]) -> Result<RaceHeader, ScriptError> {
    let (raw, _warnings) = scan_header(lines);
    RaceHeader::validate(&raw)
}

// ── Field validators ──────────────────────────────────────────────────────────

fn required_value(raw: &RawHeader, key: HeaderKey) -> Result<&str, ScriptError> {
    raw.get_or_default(key)
        .ok_or(ScriptError::MissingField { field: key })
}

fn parse_int(
    raw: &RawHeader,
    key: HeaderKey,
    in_range: impl Fn(i32) -> bool,
    expected: &str,
) -> Result<i32, ScriptError> {
    let value = required_value(raw, key)?;
    match value.parse::<i32>() {
        Ok(n) if in_range(n) => Ok(n),
        _ => Err(invalid(key, value, expected)),
    }
}

fn parse_choice(
    raw: &RawHeader,
    key: HeaderKey,
    is_known: fn(&str) -> bool,
    choices: &[&str],
) -> Result<String, ScriptError> {
    let value = required_value(raw, key)?;
    if is_known(value) {
        Ok(value.to_string())
    } else {
        Err(invalid(key, value, &describe_choices(choices)))
    }
}

fn parse_bool(raw: &RawHeader, key: HeaderKey) -> Result<bool, ScriptError> {
    let value = required_value(raw, key)?;
    match value.to_ascii_lowercase().as_str() {
        "t" | "true" | "1" => Ok(true),
        "f" | "false" | "0" => Ok(false),
        _ => Err(invalid(key, value, "one of: t, true, 1, f, false, 0")),
    }
}

fn invalid(field: HeaderKey, value: &str, expected: &str) -> ScriptError {
    ScriptError::InvalidValue {
        field,
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
