//! Static catalogs of track and kart identifiers accepted in a script header.
//!
//! Both tables hold the internal identifiers the game uses when starting a
//! race (`RaceManager::startSingleRace` / `setPlayerKart`), already lowercase
//! so that they compare directly against normalized script text.  Both
//! slices are kept sorted; diagnostics print them as-is.

/// Track identifiers accepted by the `map` header field.
pub const ALLOWED_MAPS: &[&str] = &[
    "abyss",
    "black_forest",
    "candela_city",
    "cocoa_temple",
    "cornfield_crossing",
    "fortmagma",
    "gran_paradiso_island",
    "hacienda",
    "lighthouse",
    "mines",
    "minigolf",
    "olivermath",
    "ravenbridge_mansion",
    "sandtrack",
    "scotland",
    "snowmountain",
    "snowtuxpeak",
    "stk_enterprise",
    "volcano_island",
    "xr591",
    "zengarden",
];

/// Kart identifiers accepted by the `kart_name` header field.
pub const ALLOWED_KARTS: &[&str] = &[
    "adiumy",
    "amanda",
    "beastie",
    "emule",
    "gavroche",
    "gnu",
    "hexley",
    "kiki",
    "konqi",
    "midi",
    "nolok",
    "pidgin",
    "puffy",
    "sara_the_racer",
    "sara_the_wizard",
    "suzanne",
    "tux",
    "wilber",
    "xue",
];

/// Returns `true` if `name` is a known track identifier.
pub fn is_known_map(name: &str) -> bool {
    ALLOWED_MAPS.binary_search(&name).is_ok()
}

/// Returns `true` if `name` is a known kart identifier.
pub fn is_known_kart(name: &str) -> bool {
    ALLOWED_KARTS.binary_search(&name).is_ok()
}

/// Formats a catalog for an error message: `one of: a, b, c`.
pub fn describe_choices(choices: &[&str]) -> String {
    let mut sorted = choices.to_vec();
    sorted.sort_unstable();
    format!("one of: {}", sorted.join(", "))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_are_sorted_for_binary_search() {
        assert!(ALLOWED_MAPS.windows(2).all(|w| w[0] < w[1]));
        assert!(ALLOWED_KARTS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_catalogs_are_lowercase() {
        for name in ALLOWED_MAPS.iter().chain(ALLOWED_KARTS) {
            assert_eq!(*name, name.to_lowercase());
        }
    }

    #[test]
    fn test_known_map_and_kart() {
        assert!(is_known_map("abyss"));
        assert!(is_known_kart("tux"));
        assert!(!is_known_map("tux"));
        assert!(!is_known_kart("abyss"));
    }

    #[test]
    fn test_describe_choices_sorts() {
        assert_eq!(describe_choices(&["c", "a", "b"]), "one of: a, b, c");
    }
}
