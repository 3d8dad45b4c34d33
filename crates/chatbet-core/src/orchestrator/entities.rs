//! Deterministic entity extraction from the raw user message.
//!
//! Teams are matched against the configured known-team list (plus a few
//! common nicknames), tournaments against the upstream tournament list;
//! stakes and odds are read as exact decimals.

use std::str::FromStr;

use chatbet_types::sports::Tournament;
use rust_decimal::Decimal;

/// Nicknames mapped to the canonical team name they stand for.
const ALIASES: &[(&str, &str)] = &[
    ("barca", "Barcelona"),
    ("atleti", "Atletico Madrid"),
    ("man city", "Manchester City"),
    ("man utd", "Manchester United"),
    ("man united", "Manchester United"),
    ("spurs", "Tottenham"),
    ("paris saint-germain", "PSG"),
    ("bayern", "Bayern Munich"),
    ("dortmund", "Borussia Dortmund"),
    ("bvb", "Borussia Dortmund"),
    ("juve", "Juventus"),
    ("inter", "Inter Milan"),
];

/// Phrases that refer back to teams from earlier turns.
const BACK_REFERENCES: &[&str] = &[
    "they", "them", "their", "those", "that match", "that game", "this match", "same match",
];

const CURRENCY_WORDS: &[&str] = &["dollars", "dollar", "usd", "bucks"];
const STAKE_VERBS: &[&str] = &["bet", "stake", "wager", "put"];

/// Matches team mentions in a message.
#[derive(Debug, Clone)]
pub struct TeamMatcher {
    /// `(lowercase alias, canonical name)`, longest alias first.
    patterns: Vec<(String, String)>,
}

impl TeamMatcher {
    pub fn new(known_teams: &[String]) -> Self {
        let mut patterns: Vec<(String, String)> = known_teams
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| (t.trim().to_lowercase(), t.trim().to_string()))
            .collect();
        for (alias, canonical) in ALIASES {
            if let Some(name) = known_teams.iter().find(|t| t.eq_ignore_ascii_case(canonical)) {
                patterns.push((alias.to_string(), name.clone()));
            }
        }
        patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { patterns }
    }

    /// Canonical team names in order of first mention, without duplicates.
    pub fn find(&self, message: &str) -> Vec<String> {
        let mut haystack = message.to_lowercase();
        let mut hits: Vec<(usize, String)> = Vec::new();

        for (alias, canonical) in &self.patterns {
            while let Some(at) = find_word(&haystack, alias) {
                // Mask the span so shorter aliases cannot match inside it.
                haystack.replace_range(at..at + alias.len(), &" ".repeat(alias.len()));
                hits.push((at, canonical.clone()));
            }
        }

        hits.sort_by_key(|(at, _)| *at);
        let mut teams: Vec<String> = Vec::new();
        for (_, name) in hits {
            if !teams.contains(&name) {
                teams.push(name);
            }
        }
        teams
    }

    /// Teams named in the message, or the remembered ones when the message
    /// names none and refers back to them.
    pub fn resolve(&self, message: &str, remembered: &[String]) -> Vec<String> {
        let found = self.find(message);
        if found.is_empty() && refers_back(message) {
            return remembered.to_vec();
        }
        found
    }
}

pub fn refers_back(message: &str) -> bool {
    let lower = message.to_lowercase();
    BACK_REFERENCES.iter().any(|phrase| find_word(&lower, phrase).is_some())
}

/// Tournaments named in the message, in list order.
///
/// A name also matches without its first word when two or more words remain,
/// so "UEFA Champions League" is found from "champions league".
pub fn find_tournaments(message: &str, tournaments: &[Tournament]) -> Vec<Tournament> {
    let lower = message.to_lowercase();
    tournaments
        .iter()
        .filter(|t| {
            let name = t.name.trim().to_lowercase();
            if name.is_empty() {
                return false;
            }
            let short = name
                .split_once(' ')
                .map(|(_, rest)| rest)
                .filter(|rest| rest.contains(' '));
            find_word(&lower, &name).is_some()
                || short.is_some_and(|short| find_word(&lower, short).is_some())
        })
        .cloned()
        .collect()
}

/// Stake amount: "$100", "100 dollars", "100 usd", "bet 100".
pub fn parse_stake(message: &str) -> Option<Decimal> {
    let tokens = tokenize(message);
    for (i, token) in tokens.iter().enumerate() {
        if let Some(rest) = token.strip_prefix('$') {
            let amount = if rest.is_empty() {
                tokens.get(i + 1).and_then(|t| number(t))
            } else {
                number(rest)
            };
            if amount.is_some() {
                return amount;
            }
        }
        if let Some(amount) = number(token) {
            if tokens.get(i + 1).is_some_and(|next| CURRENCY_WORDS.contains(&next.as_str())) {
                return Some(amount);
            }
        }
        if STAKE_VERBS.contains(&token.as_str()) {
            if let Some(amount) = tokens
                .get(i + 1)
                .and_then(|next| number(next.strip_prefix('$').unwrap_or(next)))
            {
                return Some(amount);
            }
        }
    }
    None
}

/// Explicit decimal odds: "odds 2.50", "odds of 2.5", "@ 2.50", "at odds 2.50".
pub fn parse_odds(message: &str) -> Option<Decimal> {
    let tokens = tokenize(message);
    for (i, token) in tokens.iter().enumerate() {
        let candidate = match token.as_str() {
            "odds" => {
                let next = match tokens.get(i + 1).map(String::as_str) {
                    Some("of") | Some("at") => tokens.get(i + 2),
                    _ => tokens.get(i + 1),
                };
                next.and_then(|t| number(t))
            }
            "@" => tokens.get(i + 1).and_then(|t| number(t)),
            other => other.strip_prefix('@').and_then(number),
        };
        if candidate.is_some() {
            return candidate;
        }
    }
    None
}

fn tokenize(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !(c.is_alphanumeric() || matches!(c, '$' | '.' | '@')))
                .trim_end_matches('.')
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

fn number(token: &str) -> Option<Decimal> {
    let cleaned = token.replace(',', "");
    if !cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Byte offset of `needle` in `haystack` where it stands as whole words.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        let bounded = |c: Option<char>| c.is_none_or(|c| !c.is_alphanumeric());
        if bounded(before) && bounded(after) {
            return Some(start);
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}
