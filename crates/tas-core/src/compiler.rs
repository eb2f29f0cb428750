//! End-to-end pipeline: script text in, payload bytes out.

use serde::Serialize;
use tracing::info;

use crate::protocol::payload::encode_payload;
use crate::script::error::ScriptError;
use crate::script::{parse_script, ScriptOptions, TasScript};

/// A successfully compiled script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledScript {
    /// The parsed model, including any header warnings.
    pub script: TasScript,
    /// Header bytes followed by every framebulk record.
    #[serde(skip)]
    pub payload: Vec<u8>,
}

/// Compiles `source` into a payload.
///
/// Parsing runs to completion before any byte is encoded, so an error never
/// leaves a partial payload behind.
///
/// # Errors
///
/// Returns the first fatal [`ScriptError`] found.
///
/// # Examples
///
/// ```rust
/// use tas_core::{compile_script, ScriptOptions};
///
/// let source = "map abyss\nkart_name tux\nnum_laps 1\ndifficulty 0\nframebulks\na-|---|0|10|\n";
/// let compiled = compile_script(source, &ScriptOptions::default()).unwrap();
/// assert_eq!(compiled.script.framebulks.len(), 1);
/// assert!(compiled.payload.starts_with(b"abyss\0tux\0"));
/// ```
pub fn compile_script(source: &str, options: &ScriptOptions) -> Result<CompiledScript, ScriptError> {
    let script = parse_script(source, options)?;
    let payload = encode_payload(&script.header, &script.framebulks);

    info!(
        "compiled {} framebulks into {} payload bytes",
        script.framebulks.len(),
        payload.len()
    );

    Ok(CompiledScript { script, payload })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::payload::{decode_payload, encode_header, FRAMEBULK_SIZE};
    use crate::script::header::HeaderKey;

    const SOURCE: &str = "\
map = abyss
kart_name = tux
num_laps = 1
difficulty = 2
framebulks
playspeed 5.0
a-|---|0|100|
";

    #[test]
    fn test_compile_script_payload_matches_model() {
        // Act
        let compiled = compile_script(SOURCE, &ScriptOptions::default()).unwrap();

        // Assert
        let header_len = encode_header(&compiled.script.header).len();
        assert_eq!(compiled.payload.len(), header_len + 2 * FRAMEBULK_SIZE);
        let (header, bulks) = decode_payload(&compiled.payload).unwrap();
        assert_eq!(header, compiled.script.header);
        assert_eq!(bulks, compiled.script.framebulks);
    }

    #[test]
    fn test_compile_script_missing_difficulty_produces_no_payload() {
        let source = SOURCE.replace("difficulty = 2\n", "");
        let err = compile_script(&source, &ScriptOptions::default()).unwrap_err();
        assert_eq!(err, ScriptError::MissingField { field: HeaderKey::Difficulty });
    }

    #[test]
    fn test_compile_script_is_deterministic() {
        let a = compile_script(SOURCE, &ScriptOptions::default()).unwrap();
        let b = compile_script(SOURCE, &ScriptOptions::default()).unwrap();
        assert_eq!(a.payload, b.payload);
    }
}
