//! Geographic tagging of links and pages

use std::collections::BTreeSet;

/// Tag for regional wording that names no particular state
pub const REGIONAL_UNSPECIFIED: &str = "regional_unspecified";

/// Fifty states plus the District of Columbia
pub const STATE_COUNT: usize = 51;

/// Full name (lowercase, space separated) and postal code of every state
pub const STATES: [(&str, &str); STATE_COUNT] = [
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("district of columbia", "DC"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

const REGIONAL_STEMS: [&str; 5] = [
    "medicaid",
    "region",
    "zone",
    "state-specific",
    "state specific",
];

/// Returns the postal code for a two-letter token, if it names a state
pub fn state_code(token: &str) -> Option<&'static str> {
    if token.len() != 2 {
        return None;
    }
    STATES
        .iter()
        .map(|(_, code)| *code)
        .find(|code| code.eq_ignore_ascii_case(token))
}

/// Returns the full lowercase name for a postal code
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code))
        .map(|(name, _)| *name)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Finds full state names as whole token sequences
///
/// Longer names win at a given position and consume their tokens, so
/// "west virginia" yields WV only.
pub fn full_name_tags(text: &str, tags: &mut BTreeSet<String>) {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = tokens(&lowered).collect();

    let mut names: Vec<(Vec<&str>, &str)> = STATES
        .iter()
        .map(|(name, code)| (name.split(' ').collect(), *code))
        .collect();
    names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut i = 0;
    while i < words.len() {
        let hit = names.iter().find(|(parts, _)| {
            i + parts.len() <= words.len() && words[i..i + parts.len()] == parts[..]
        });
        match hit {
            Some((parts, code)) => {
                tags.insert((*code).to_string());
                i += parts.len();
            }
            None => i += 1,
        }
    }
}

/// Finds postal codes among the URL path segments (case-insensitive)
pub fn path_code_tags(path: &str, tags: &mut BTreeSet<String>) {
    for token in tokens(path) {
        if let Some(code) = state_code(token) {
            tags.insert(code.to_string());
        }
    }
}

/// Finds postal codes written in upper case in anchor text
///
/// Lower and mixed case tokens are ignored so that words like "in", "or"
/// and "Me" do not read as states.
pub fn anchor_code_tags(anchor_text: &str, tags: &mut BTreeSet<String>) {
    for token in tokens(anchor_text) {
        if token.chars().all(|c| c.is_ascii_uppercase()) {
            if let Some(code) = state_code(token) {
                tags.insert(code.to_string());
            }
        }
    }
}

/// Adds `regional_unspecified` if the text carries a regional stem
pub fn stem_tags(text: &str, tags: &mut BTreeSet<String>) {
    let lowered = text.to_lowercase();
    if REGIONAL_STEMS.iter().any(|stem| lowered.contains(stem)) {
        tags.insert(REGIONAL_UNSPECIFIED.to_string());
    }
}

/// Returns true if the tag is a state code rather than a marker
pub fn is_state_tag(tag: &str) -> bool {
    tag.len() == 2 && state_code(tag).is_some()
}
