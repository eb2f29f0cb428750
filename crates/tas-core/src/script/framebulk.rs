//! Framebulk parser: the per-tick input timeline after the sentinel line.
//!
//! Each line is one of:
//!
//! - `playspeed <float>` – change the game's playback speed.
//! - `<accel>|<misc>|<angle>|<ticks>|` – hold a set of controls for `ticks`
//!   game ticks.
//!
//! # Control fields
//!
//! ```text
//! accel  position 0: 'a' = accelerate     position 1: 'b' = brake
//! misc   position 0: 'f' = fire ability   position 1: 'n' = nitro
//!        position 2: 's' = skid
//! ```
//!
//! Any other character in one of these positions (conventionally `-`) leaves
//! the flag clear.  Positions are counted on the raw field, so a leading space
//! occupies position 0.  Only the angle and tick fields are trimmed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::script::error::ScriptError;
use crate::script::normalize::ScriptLine;

/// Keyword that starts a playback-speed directive.
pub const PLAYSPEED_KEYWORD: &str = "playspeed";

/// Delimiter between the fields of a control line.
pub const FIELD_DELIMITER: char = '|';

// ── Input flags ───────────────────────────────────────────────────────────────

/// Bit set of the controls held during a framebulk.
///
/// The numeric bit values are a stable contract with the control module and
/// must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputFlags(pub u16);

impl InputFlags {
    pub const ACCEL: u16 = 1 << 0;
    pub const DECEL: u16 = 1 << 1;
    pub const ABILITY: u16 = 1 << 2;
    pub const NITRO: u16 = 1 << 3;
    pub const SKID: u16 = 1 << 4;
    pub const SET_SPEED: u16 = 1 << 5;

    /// Union of every defined bit.
    pub const ALL: u16 = Self::ACCEL
        | Self::DECEL
        | Self::ABILITY
        | Self::NITRO
        | Self::SKID
        | Self::SET_SPEED;

    /// Flags with no bit set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns the raw wire value.
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Builds flags from a wire value, rejecting unknown bits.
    pub fn from_bits(bits: u16) -> Option<Self> {
        if bits & !Self::ALL == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Returns `true` if every bit in `flag` is set.
    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    /// Sets or clears `flag`.
    pub fn set(&mut self, flag: u16, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Returns a copy with `flag` added.
    pub const fn with(self, flag: u16) -> Self {
        Self(self.0 | flag)
    }
}

// ── Framebulk ─────────────────────────────────────────────────────────────────

/// One unit of the input timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Framebulk {
    /// How many game ticks the controls are held.  Always `0` for a
    /// playback-speed directive.
    pub num_ticks: i16,
    /// Steering angle for control records; the new speed for a playback-speed
    /// directive.
    pub angle: f32,
    /// Controls held during the bulk.
    pub flags: InputFlags,
}

impl Framebulk {
    /// Creates a control record.  `SET_SPEED` is never set on this path.
    pub fn control(num_ticks: i16, angle: f32, flags: InputFlags) -> Self {
        let mut flags = flags;
        flags.set(InputFlags::SET_SPEED, false);
        Self {
            num_ticks,
            angle,
            flags,
        }
    }

    /// Creates a playback-speed directive.
    pub fn playspeed(speed: f32) -> Self {
        Self {
            num_ticks: 0,
            angle: speed,
            flags: InputFlags(InputFlags::SET_SPEED),
        }
    }

    /// Returns `true` for a playback-speed directive.
    pub fn is_playspeed(&self) -> bool {
        self.flags.contains(InputFlags::SET_SPEED)
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parses every framebulk line in order.
///
/// Order is the input timeline and is preserved exactly; nothing is merged
/// or deduplicated.
///
/// # Errors
///
/// Returns the [`ScriptError::FramebulkSyntax`] for the first line that does
/// not parse.  No framebulks are returned in that case.
pub fn parse_framebulks(lines: &[ScriptLine]) -> Result<Vec<Framebulk>, ScriptError> {
    lines.iter().map(parse_framebulk_line).collect()
}

/// Parses a single normalized framebulk line.
///
/// # Errors
///
/// [`ScriptError::FramebulkSyntax`] citing `line.line_number` when the line
/// does not split into exactly four fields, a control field is too short, or
/// the angle or tick count is not a number.
pub fn parse_framebulk_line(line: &ScriptLine) -> Result<Framebulk, ScriptError> {
    if let Some(speed) = match_playspeed(&line.text) {
        debug!("line {}: playspeed {speed}", line.line_number);
        return Ok(Framebulk::playspeed(speed));
    }

    let fields: Vec<&str> = line
        .text
        .split(FIELD_DELIMITER)
        .filter(|f| !f.trim().is_empty())
        .collect();

    let [accel, misc, angle, ticks] = fields.as_slice() else {
        return Err(syntax(
            line,
            format!("expected 4 '|'-separated fields, found {}", fields.len()),
        ));
    };

    let accel: Vec<char> = accel.chars().collect();
    if accel.len() < 2 {
        return Err(syntax(line, "acceleration field needs 2 characters"));
    }
    let misc: Vec<char> = misc.chars().collect();
    if misc.len() < 3 {
        return Err(syntax(line, "misc field needs 3 characters"));
    }

    let mut flags = InputFlags::empty();
    flags.set(InputFlags::ACCEL, accel[0] == 'a');
    flags.set(InputFlags::DECEL, accel[1] == 'b');
    flags.set(InputFlags::ABILITY, misc[0] == 'f');
    flags.set(InputFlags::NITRO, misc[1] == 'n');
    flags.set(InputFlags::SKID, misc[2] == 's');

    let angle = angle.trim();
    let angle: f32 = angle
        .parse()
        .map_err(|_| syntax(line, format!("angle '{angle}' is not a number")))?;
    let ticks = ticks.trim();
    let num_ticks: i16 = ticks
        .parse()
        .map_err(|_| syntax(line, format!("tick count '{ticks}' is not a 16-bit integer")))?;

    debug!(
        "line {}: {num_ticks} ticks, angle {angle}, flags {:#04x}",
        line.line_number,
        flags.to_bits()
    );
    Ok(Framebulk::control(num_ticks, angle, flags))
}

/// Recognizes `playspeed <float>` and returns the speed.
fn match_playspeed(text: &str) -> Option<f32> {
    let rest = text.strip_prefix(PLAYSPEED_KEYWORD)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let literal = rest.trim();
    if !is_float_literal(literal) {
        return None;
    }
    literal.parse().ok()
}

/// Checks `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`.
///
/// `str::parse::<f32>` also accepts `inf` and `nan`, which a script must not
/// use as a speed.
fn is_float_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

fn syntax(line: &ScriptLine, reason: impl Into<String>) -> ScriptError {
    ScriptError::FramebulkSyntax {
        line: line.line_number,
        reason: reason.into(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> ScriptLine {
        ScriptLine::new(7, text)
    }

    // ── InputFlags ────────────────────────────────────────────────────────────

    #[test]
    fn test_flag_bit_values_are_stable() {
        assert_eq!(InputFlags::ACCEL, 1);
        assert_eq!(InputFlags::DECEL, 2);
        assert_eq!(InputFlags::ABILITY, 4);
        assert_eq!(InputFlags::NITRO, 8);
        assert_eq!(InputFlags::SKID, 16);
        assert_eq!(InputFlags::SET_SPEED, 32);
    }

    #[test]
    fn test_from_bits_rejects_unknown_bits() {
        assert_eq!(InputFlags::from_bits(0b11_1111), Some(InputFlags(63)));
        assert_eq!(InputFlags::from_bits(64), None);
    }

    #[test]
    fn test_control_constructor_clears_set_speed() {
        let fb = Framebulk::control(10, 0.0, InputFlags(InputFlags::ACCEL | InputFlags::SET_SPEED));
        assert_eq!(fb.flags, InputFlags(InputFlags::ACCEL));
        assert!(!fb.is_playspeed());
    }

    // ── Playspeed ─────────────────────────────────────────────────────────────

    #[test]
    fn test_playspeed_line() {
        let fb = parse_framebulk_line(&line("playspeed 3.0")).unwrap();
        assert_eq!(fb, Framebulk::playspeed(3.0));
        assert_eq!(fb.num_ticks, 0);
        assert_eq!(fb.flags.to_bits(), InputFlags::SET_SPEED);
    }

    #[test]
    fn test_playspeed_literal_forms() {
        for (text, expected) in [
            ("playspeed 1", 1.0),
            ("playspeed -0.5", -0.5),
            ("playspeed +2.", 2.0),
            ("playspeed .25", 0.25),
            ("playspeed 1e1", 10.0),
            ("playspeed 2.5e-1", 0.25),
        ] {
            assert_eq!(match_playspeed(text), Some(expected), "{text}");
        }
    }

    #[test]
    fn test_playspeed_rejects_non_numeric() {
        for text in ["playspeed", "playspeed fast", "playspeed inf", "playspeed 1e", "playspeed3.0", "playspeed ."] {
            assert_eq!(match_playspeed(text), None, "{text}");
        }
    }

    #[test]
    fn test_malformed_playspeed_is_syntax_error() {
        let err = parse_framebulk_line(&line("playspeed fast")).unwrap_err();
        assert_eq!(err.line(), Some(7));
    }

    // ── Control records ───────────────────────────────────────────────────────

    #[test]
    fn test_control_line_accel_only() {
        let fb = parse_framebulk_line(&line("a-|---|0|100|")).unwrap();
        assert_eq!(fb, Framebulk::control(100, 0.0, InputFlags(InputFlags::ACCEL)));
    }

    #[test]
    fn test_control_line_every_flag() {
        let fb = parse_framebulk_line(&line("ab|fns|-1.5|20|")).unwrap();
        assert_eq!(
            fb.flags.to_bits(),
            InputFlags::ACCEL | InputFlags::DECEL | InputFlags::ABILITY | InputFlags::NITRO | InputFlags::SKID
        );
        assert_eq!(fb.angle, -1.5);
        assert_eq!(fb.num_ticks, 20);
    }

    #[test]
    fn test_control_line_markers_are_positional() {
        // 'b' in position 0 and 'a' in position 1 do not set anything.
        let fb = parse_framebulk_line(&line("ba|sfn|0|1|")).unwrap();
        assert_eq!(fb.flags, InputFlags::empty());
    }

    #[test]
    fn test_control_line_unexpected_characters_are_unset() {
        let fb = parse_framebulk_line(&line("x?|zzz|0|5|")).unwrap();
        assert_eq!(fb.flags, InputFlags::empty());
    }

    #[test]
    fn test_numeric_fields_tolerate_surrounding_spaces() {
        let fb = parse_framebulk_line(&line("a-|-n-| 0.5 | 30 |")).unwrap();
        assert_eq!(fb, Framebulk::control(30, 0.5, InputFlags(InputFlags::ACCEL | InputFlags::NITRO)));
    }

    #[test]
    fn test_leading_space_shifts_control_positions() {
        // Arrange: ' ', '-', 'n' occupy positions 0..3 of the misc field.
        let source = line("a-| -n-|0|5|");

        // Act
        let fb = parse_framebulk_line(&source).unwrap();

        // Assert
        assert_eq!(fb.flags, InputFlags(InputFlags::ACCEL));
    }

    #[test]
    fn test_space_padded_accel_field_reads_raw_positions() {
        let fb = parse_framebulk_line(&line(" a|---|0|5|")).unwrap();
        assert_eq!(fb.flags, InputFlags::empty());
    }

    #[test]
    fn test_control_line_trailing_delimiter_optional() {
        let fb = parse_framebulk_line(&line("a-|---|0|100")).unwrap();
        assert_eq!(fb.num_ticks, 100);
    }

    #[test]
    fn test_three_fields_is_syntax_error_with_line() {
        let err = parse_framebulk_line(&line("a-|---|100|")).unwrap_err();
        assert!(matches!(err, ScriptError::FramebulkSyntax { line: 7, .. }));
    }

    #[test]
    fn test_five_fields_is_syntax_error() {
        assert!(parse_framebulk_line(&line("a-|---|0|100|5|")).is_err());
    }

    #[test]
    fn test_short_control_fields_are_syntax_errors() {
        assert!(parse_framebulk_line(&line("a|---|0|100|")).is_err());
        assert!(parse_framebulk_line(&line("a-|--|0|100|")).is_err());
    }

    #[test]
    fn test_bad_numbers_are_syntax_errors() {
        assert!(parse_framebulk_line(&line("a-|---|left|100|")).is_err());
        assert!(parse_framebulk_line(&line("a-|---|0|1.5|")).is_err());
        assert!(parse_framebulk_line(&line("a-|---|0|40000|")).is_err());
    }

    // ── Sequences ─────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_framebulks_simple_sequence() {
        let lines = vec![ScriptLine::new(0, "a-|---|0|100|"), ScriptLine::new(1, "playspeed 3.0")];
        let bulks = parse_framebulks(&lines).unwrap();
        assert_eq!(
            bulks,
            vec![
                Framebulk::control(100, 0.0, InputFlags(InputFlags::ACCEL)),
                Framebulk::playspeed(3.0),
            ]
        );
    }

    #[test]
    fn test_parse_framebulks_preserves_duplicates_and_order() {
        let lines = vec![
            ScriptLine::new(1, "a-|---|0|10|"),
            ScriptLine::new(2, "a-|---|0|10|"),
            ScriptLine::new(3, "--|---|1|5|"),
        ];
        let bulks = parse_framebulks(&lines).unwrap();
        assert_eq!(bulks.len(), 3);
        assert_eq!(bulks[0], bulks[1]);
        assert_eq!(bulks[2].angle, 1.0);
    }

    #[test]
    fn test_parse_framebulks_stops_at_first_error() {
        let lines = vec![
            ScriptLine::new(10, "a-|---|0|10|"),
            ScriptLine::new(11, "a-|---|10|"),
            ScriptLine::new(12, "garbage"),
        ];
        let err = parse_framebulks(&lines).unwrap_err();
        assert_eq!(err.line(), Some(11));
    }
}
