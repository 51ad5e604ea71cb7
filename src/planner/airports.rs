//! Fixed airport table shared by the extractor and the fallback catalog.
//!
//! The same entries drive both directions: expanding a code the user typed
//! into a display form, and turning a city name back into a code for
//! route strings.

/// One known airport.
#[derive(Debug, Clone, Copy)]
pub struct Airport {
    pub code: &'static str,
    pub city: &'static str,
    /// Lowercase substrings that identify this city in free text.
    pub aliases: &'static [&'static str],
}

const AIRPORTS: &[Airport] = &[
    Airport { code: "RDU", city: "Raleigh-Durham", aliases: &["raleigh-durham", "raleigh", "durham"] },
    Airport { code: "JFK", city: "New York", aliases: &["new york"] },
    Airport { code: "LAX", city: "Los Angeles", aliases: &["los angeles"] },
    Airport { code: "SFO", city: "San Francisco", aliases: &["san francisco"] },
    Airport { code: "ORD", city: "Chicago", aliases: &["chicago"] },
    Airport { code: "DFW", city: "Dallas", aliases: &["dallas"] },
    Airport { code: "ATL", city: "Atlanta", aliases: &["atlanta"] },
    Airport { code: "CDG", city: "Paris", aliases: &["paris"] },
    Airport { code: "NRT", city: "Tokyo", aliases: &["tokyo"] },
    Airport { code: "LHR", city: "London", aliases: &["london"] },
    Airport { code: "BCN", city: "Barcelona", aliases: &["barcelona"] },
];

/// Origin used for route strings when the user never gave one.
pub const DEFAULT_ORIGIN_CODE: &str = "RDU";

/// Look up an airport by its exact IATA code (case-sensitive, uppercase).
pub fn by_code(code: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.code == code)
}

/// Display form for a code: `"City (CODE)"` when known, the code itself
/// otherwise.
pub fn expand_code(code: &str) -> String {
    match by_code(code) {
        Some(airport) => format!("{} ({})", airport.city, airport.code),
        None => code.to_string(),
    }
}

/// Best-effort airport code for a free-text location.
///
/// Matches a known alias or code anywhere in the text (so `"New York (JFK)"`
/// and `"jfk"` both resolve). Unknown locations fall back to their first
/// three letters, uppercased.
pub fn code_for_location(location: &str) -> String {
    let lower = location.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    for airport in AIRPORTS {
        let code = airport.code.to_lowercase();
        if airport.aliases.iter().any(|alias| lower.contains(alias))
            || words.iter().any(|w| *w == code)
        {
            return airport.code.to_string();
        }
    }
    location
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_known_code() {
        assert_eq!(expand_code("RDU"), "Raleigh-Durham (RDU)");
        assert_eq!(expand_code("JFK"), "New York (JFK)");
    }

    #[test]
    fn expand_unknown_code_is_identity() {
        assert_eq!(expand_code("XYZ"), "XYZ");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(by_code("jfk").is_none());
        assert!(by_code("JFK").is_some());
    }

    #[test]
    fn code_for_city_names() {
        assert_eq!(code_for_location("Paris"), "CDG");
        assert_eq!(code_for_location("new york"), "JFK");
        assert_eq!(code_for_location("Raleigh-Durham (RDU)"), "RDU");
    }

    #[test]
    fn code_for_expanded_display_form() {
        assert_eq!(code_for_location(&expand_code("SFO")), "SFO");
    }

    #[test]
    fn code_match_requires_whole_word() {
        assert_eq!(code_for_location("Cordoba"), "COR");
        assert_eq!(code_for_location("ord"), "ORD");
    }

    #[test]
    fn code_for_unknown_city_uses_prefix() {
        assert_eq!(code_for_location("Lisbon"), "LIS");
        assert_eq!(code_for_location(""), "");
    }
}
