//! Preference extraction: free-form utterance + prior slots → updated slots.
//!
//! Every slot owns an ordered list of named strategies. The first strategy
//! with an acceptable match wins and later strategies are not consulted, so
//! the declaration order below *is* the precedence. Slots are extracted
//! independently of each other.
//!
//! Extraction never clears a slot: a slot with no match this turn keeps its
//! prior value.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::airports;
use super::slots::{AccommodationType, Interest, SlotStore};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Year stamped onto dates synthesized from a compact `Month D1-D2` range.
pub const SYNTHESIZED_YEAR: u16 = 2024;

/// A run of capitalized words: `Paris`, `New York City`, `São Paulo`.
const PLACE: &str = r"(\p{Lu}[\p{L}'-]*(?: \p{Lu}[\p{L}'-]*)*)";

/// Month names, full forms before abbreviations.
const MONTH: &str = "(?:january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)";

/// A single date in any of the accepted textual shapes.
const DATE: &str = r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|<MONTH>\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}\s+<MONTH>\s+\d{4}|<MONTH>\s+\d{1,2}(?:st|nd|rd|th)?\b)";

const MONTH_NAMES: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Words trimmed off the end of a captured place.
const CONNECTORS: &[&str] = &[
    "from", "on", "with", "for", "in", "at", "the", "to", "and", "during",
];

/// Captures that look like places but never are.
const NOT_PLACES: &[&str] = &["i", "i'm", "i'd", "i'll", "we", "we're", "my", "our", "it"];

/// Well-known cities recognized anywhere in the text when no destination
/// phrase matched.
const KNOWN_CITIES: &[&str] = &[
    "paris", "tokyo", "london", "new york", "san francisco", "los angeles", "barcelona", "rome",
    "dubai", "singapore", "bangkok", "sydney", "amsterdam", "berlin", "madrid",
];

// ─── Strategies ─────────────────────────────────────────────────────────────

/// A named extraction pattern. Capture group 1 (and 2 where noted) carries
/// the value.
struct Strategy {
    name: &'static str,
    pattern: Regex,
}

impl Strategy {
    fn new(name: &'static str, template: &str) -> Self {
        let source = template
            .replace("<DATE>", DATE)
            .replace("<MONTH>", MONTH)
            .replace("<PLACE>", PLACE);
        Self {
            name,
            pattern: Regex::new(&source).expect("extraction pattern must compile"),
        }
    }
}

static DESTINATION_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "travel_phrase",
            r"\b(?i:going to|traveling to|travelling to|visiting|visit|destination is|trip to|planning to go to|want to go to|heading to|travel to|flying to|fly to)\s+<PLACE>",
        ),
        Strategy::new("to_or_in", r"\b(?i:to|in)\s+<PLACE>"),
        Strategy::new(
            "intent_phrase",
            r"\b(?i:i want to|i['’]d like to|planning|plan)\s+(?i:a trip to\s+|to visit\s+|to go to\s+)?<PLACE>",
        ),
    ]
});

static ORIGIN_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        // Group 1: airport code, group 2: place.
        Strategy::new(
            "from_phrase",
            r"\b(?i:leaving from|departing from|flying from|from)\s+(?:([A-Z]{3})\b|<PLACE>)",
        ),
        Strategy::new("code_before_preposition", r"\b([A-Z]{3})\s+(?i:from|to|in|on)\b"),
        Strategy::new("known_code", r"\b([A-Z]{3})\b"),
    ]
});

static DATE_RANGE: LazyLock<Strategy> = LazyLock::new(|| {
    Strategy::new(
        "compact_range",
        r"(?i)\b(<MONTH>)\s+(\d{1,2})\s*[-–—]\s*(\d{1,2})\b",
    )
});

static START_DATE_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "start_phrase",
            r"(?i)\b(?:from|starting|beginning|departing|leaving|on)\s+<DATE>",
        ),
        Strategy::new(
            "numeric_before_until",
            r"(?i)\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\s+(?:to|until|through)\b",
        ),
        Strategy::new(
            "month_phrase",
            r"(?i)\b(?:in|during|for)\s+(<MONTH>\s+\d{4}|<MONTH>\s+\d{1,2})\b",
        ),
    ]
});

static END_DATE_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![Strategy::new(
        "end_phrase",
        r"(?i)\b(?:to|until|through|ending|returning)\s+<DATE>",
    )]
});

static DURATION: LazyLock<Strategy> = LazyLock::new(|| {
    Strategy::new(
        "duration_phrase",
        r"(?i)\b(?:for|duration of|staying)\s+(\d+)\s+(days?|weeks?|nights?)\b",
    )
});

static BUDGET_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "budget_phrase",
            r"(?i)\b(?:budget|spending|cost|price)\b[\s:]*(?:(?:of|is|around|about|roughly)\s+)*\$?\s*(\d+(?:,\d{3})*(?:\.\d{2})?)",
        ),
        Strategy::new("dollar_amount", r"\$\s?(\d+(?:,\d{3})*(?:\.\d{2})?)"),
    ]
});

static TRAVELER_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "count_before_people",
            r"(?i)\b(\d+)\s+(?:people|persons?|travell?ers|guests|adults)\b",
        ),
        Strategy::new(
            "traveling_with",
            r"(?i)\b(?:traveling|travelling|going)\s+(?:with|as)\s+(\d+)\b",
        ),
        Strategy::new("party_of", r"(?i)\b(?:party|group)\s+of\s+(\d+)\b"),
    ]
});

static INTEREST_PATTERNS: LazyLock<Vec<(Interest, Regex)>> = LazyLock::new(|| {
    Interest::ALL
        .into_iter()
        .map(|interest| {
            let words = interest_keywords(interest);
            let pattern = Regex::new(&format!(r"(?i)\b(?:{words})\b"))
                .expect("interest pattern must compile");
            (interest, pattern)
        })
        .collect()
});

fn interest_keywords(interest: Interest) -> &'static str {
    match interest {
        Interest::Sightseeing => r"sightseeing|sightsee|sights|landmarks?",
        Interest::Nightlife => r"nightlife|night life|bars|clubs|clubbing",
        Interest::Nature => r"nature|hiking|hikes?|outdoors?|parks?",
        Interest::Culture => r"culture|cultural|museums?|art|arts|galler(?:y|ies)|history",
        Interest::Food => r"food|foodie|restaurants?|cuisine|dining",
    }
}

// ─── Entry Point ────────────────────────────────────────────────────────────

/// Update `prior` with everything recognizable in `utterance`.
///
/// Total: any input, including empty or binary-looking text, yields a store.
/// With no matches the result equals `prior`.
pub fn extract_preferences(utterance: &str, prior: &SlotStore) -> SlotStore {
    let mut updated = prior.clone();
    if utterance.trim().is_empty() {
        return updated;
    }

    if let Some(destination) = extract_destination(utterance) {
        updated.destination = Some(destination);
    } else if updated.destination.is_none() {
        if let Some(city) = scan_known_cities(utterance) {
            updated.destination = Some(city);
        }
    }

    if let Some(origin) = extract_origin(utterance, updated.destination.as_deref()) {
        updated.origin = Some(origin);
    }

    apply_dates(utterance, &mut updated);

    if let Some(budget) = extract_budget(utterance) {
        updated.budget = Some(budget);
    }
    if let Some(travelers) = extract_travelers(utterance) {
        updated.travelers = Some(travelers);
    }
    if let Some(accommodation) = extract_accommodation(utterance) {
        updated.accommodation_type = Some(accommodation);
    }
    if let Some(interests) = extract_interests(utterance) {
        updated.interests = Some(interests);
    }

    updated
}

// ─── Per-Slot Extractors ────────────────────────────────────────────────────

/// Destination from an explicit travel phrase. Does not consult the
/// well-known city list; see [`scan_known_cities`].
pub fn extract_destination(text: &str) -> Option<String> {
    match_destination(text).map(|(_, value)| value)
}

fn match_destination(text: &str) -> Option<(&'static str, String)> {
    first_match(&DESTINATION_STRATEGIES, text, |caps| {
        caps.get(1).and_then(|m| clean_place(m.as_str()))
    })
}

/// Find a well-known city mentioned anywhere, title-cased.
///
/// Mentions directly after "from" are skipped; they name the origin.
pub fn scan_known_cities(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for city in KNOWN_CITIES {
        for (idx, _) in lower.match_indices(city) {
            let end = idx + city.len();
            let before_ok = lower[..idx]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric());
            let after_ok = lower[end..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
            let after_from = lower[..idx].trim_end().ends_with("from");
            if before_ok && after_ok && !after_from {
                return Some(title_case(city));
            }
        }
    }
    None
}

/// Origin from a "from X" phrase or an airport code.
///
/// Bare codes are skipped when they directly follow "to" or name the
/// airport of `destination`; an explicit "from CODE" always counts.
pub fn extract_origin(text: &str, destination: Option<&str>) -> Option<String> {
    match_origin(text, destination).map(|(_, value)| value)
}

fn match_origin(text: &str, destination: Option<&str>) -> Option<(&'static str, String)> {
    let destination_code = destination.map(airports::code_for_location);
    for strategy in ORIGIN_STRATEGIES.iter() {
        for caps in strategy.pattern.captures_iter(text) {
            let value = match strategy.name {
                "from_phrase" => match (caps.get(1), caps.get(2)) {
                    (Some(code), _) => Some(airports::expand_code(code.as_str())),
                    (None, Some(place)) => clean_place(place.as_str()),
                    (None, None) => None,
                },
                _ => caps
                    .get(1)
                    .filter(|m| !follows_to(text, m.start()))
                    .filter(|m| destination_code.as_deref() != Some(m.as_str()))
                    .filter(|m| strategy.name != "known_code" || airports::by_code(m.as_str()).is_some())
                    .map(|m| airports::expand_code(m.as_str())),
            };
            if let Some(value) = value {
                return Some((strategy.name, value));
            }
        }
    }
    None
}

/// Whether the word right before byte offset `at` is "to".
fn follows_to(text: &str, at: usize) -> bool {
    text[..at]
        .split_whitespace()
        .next_back()
        .is_some_and(|word| word.eq_ignore_ascii_case("to"))
}

/// `Month D1-D2` → (`"Month D1, 2024"`, `"Month D2, 2024"`).
pub fn extract_date_range(text: &str) -> Option<(String, String)> {
    let caps = DATE_RANGE.pattern.captures(text)?;
    let month = title_case(caps.get(1)?.as_str());
    let start_day = caps.get(2)?.as_str();
    let end_day = caps.get(3)?.as_str();
    Some((
        format!("{month} {start_day}, {SYNTHESIZED_YEAR}"),
        format!("{month} {end_day}, {SYNTHESIZED_YEAR}"),
    ))
}

fn apply_dates(text: &str, slots: &mut SlotStore) {
    if let Some((start, end)) = extract_date_range(text) {
        slots.start_date = Some(start);
        slots.end_date = Some(end);
        return;
    }

    if let Some((_, start)) = first_capture(&START_DATE_STRATEGIES, text) {
        slots.start_date = Some(start);
    }

    if let Some((_, end)) = first_capture(&END_DATE_STRATEGIES, text) {
        slots.end_date = Some(end);
        return;
    }

    if slots.end_date.is_none() {
        if let (Some(start), Some((count, unit))) = (slots.start_date.as_ref(), extract_duration(text))
        {
            slots.end_date = Some(format!("{start} + {count} {unit}"));
        }
    }
}

/// `for N days` → (N, normalized unit). The unit is singular only for 1.
fn extract_duration(text: &str) -> Option<(u32, &'static str)> {
    let caps = DURATION.pattern.captures(text)?;
    let count: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    let unit = match (unit.starts_with("week"), unit.starts_with("night"), count == 1) {
        (true, _, true) => "week",
        (true, _, false) => "weeks",
        (_, true, true) => "night",
        (_, true, false) => "nights",
        (_, _, true) => "day",
        (_, _, false) => "days",
    };
    Some((count, unit))
}

/// Budget as `$<amount>`, commas preserved.
pub fn extract_budget(text: &str) -> Option<String> {
    first_capture(&BUDGET_STRATEGIES, text).map(|(_, amount)| format!("${amount}"))
}

/// Positive traveler count.
pub fn extract_travelers(text: &str) -> Option<u32> {
    first_match(&TRAVELER_STRATEGIES, text, |caps| {
        caps.get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0)
    })
    .map(|(_, count)| count)
}

/// First keyword hit in the order hotel, airbnb/apartment, hostel.
pub fn extract_accommodation(text: &str) -> Option<AccommodationType> {
    let lower = text.to_lowercase();
    if lower.contains("hotel") {
        Some(AccommodationType::Hotel)
    } else if lower.contains("airbnb") || lower.contains("apartment") {
        Some(AccommodationType::Airbnb)
    } else if lower.contains("hostel") {
        Some(AccommodationType::Hostel)
    } else {
        None
    }
}

/// Interest tags mentioned in `text`, ordered by first mention.
///
/// `None` when nothing matched, so the caller keeps prior interests.
pub fn extract_interests(text: &str) -> Option<Vec<Interest>> {
    let mut hits: Vec<(usize, Interest)> = INTEREST_PATTERNS
        .iter()
        .filter_map(|(interest, pattern)| pattern.find(text).map(|m| (m.start(), *interest)))
        .collect();
    if hits.is_empty() {
        return None;
    }
    hits.sort_by_key(|(position, _)| *position);
    Some(hits.into_iter().map(|(_, interest)| interest).collect())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Walk the strategies in order and return the first accepted capture.
fn first_match<T>(
    strategies: &[Strategy],
    text: &str,
    mut accept: impl FnMut(&Captures<'_>) -> Option<T>,
) -> Option<(&'static str, T)> {
    for strategy in strategies {
        for caps in strategy.pattern.captures_iter(text) {
            if let Some(value) = accept(&caps) {
                return Some((strategy.name, value));
            }
        }
    }
    None
}

/// `first_match` taking capture group 1 verbatim (trimmed).
fn first_capture(strategies: &[Strategy], text: &str) -> Option<(&'static str, String)> {
    first_match(strategies, text, |caps| {
        caps.get(1)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Cut the capture at the first month, weekday or pronoun, trim trailing
/// connectors, and reject captures that are not places.
fn clean_place(raw: &str) -> Option<String> {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    if let Some(stop) = words.iter().position(|w| is_stop_word(w)) {
        words.truncate(stop);
    }
    while words
        .last()
        .is_some_and(|w| CONNECTORS.contains(&w.to_lowercase().as_str()))
    {
        words.pop();
    }
    let place = words.join(" ");
    let len = place.chars().count();
    if !(2..50).contains(&len) {
        return None;
    }
    Some(place)
}

fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    MONTH_NAMES.contains(&lower.as_str())
        || WEEKDAYS.contains(&lower.as_str())
        || NOT_PLACES.contains(&lower.as_str())
}

/// `"new york"` → `"New York"`.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Tests ──────────────────────────────────────────────────────────────────
