//! Fuzzy query resolver over a [`SectionIndex`].
//!
//! Returns the single best section for a free-text query, or one of two
//! fixed fallback sentences. Resolution runs in tiers and stops at the first
//! tier that produces an answer:
//!
//! 1. **Key match**: the first section (insertion order) whose key contains
//!    any query word as a substring.
//! 2. **Fuzzy**: every key is scored against the query words; the strictly
//!    highest score wins, ties keep the earlier section. A best score of at
//!    least [`FUZZY_THRESHOLD`] is returned directly.
//! 3. **Body match**: otherwise, the first section whose lowercased text
//!    contains the whole normalized query.
//!
//! If the body scan finds nothing, a sub-threshold fuzzy winner is still
//! returned unless [`ResolveOptions::strict_threshold`] is set.
//!
//! # Scoring
//!
//! For every `(query_word, key_word)` pair:
//!
//! - `+1.0` if either word contains the other;
//! - `+0.5` additionally if the query word is longer than three characters
//!   and the key word contains its first four characters.
//!
//! Both awards can apply to the same pair.

use std::fmt;

use serde::Serialize;

use crate::section::SectionIndex;

/// Returned when the index holds no sections.
pub const NOT_AVAILABLE: &str = "PDF knowledge base not available. Please seek professional help.";

/// Returned when no tier produced a section.
pub const NO_GUIDANCE: &str = "Sorry, no guidance found for that. Please seek professional help.";

/// Points for a pair where one word contains the other.
pub const CONTAINMENT_POINTS: f64 = 1.0;
/// Extra points for a pair sharing the query word's leading characters.
pub const PREFIX_BONUS_POINTS: f64 = 0.5;
/// Number of leading query-word characters compared for the prefix bonus.
pub const PREFIX_LEN: usize = 4;
/// Query words need at least this many characters to earn the prefix bonus.
pub const MIN_WORD_LEN_FOR_PREFIX: usize = 4;
/// Minimum fuzzy score accepted without consulting section bodies.
pub const FUZZY_THRESHOLD: f64 = 1.0;

/// Resolver behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Never fall back to a fuzzy winner scoring below [`FUZZY_THRESHOLD`].
    pub strict_threshold: bool,
}

/// Which tier produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Unavailable,
    KeyMatch,
    Fuzzy,
    BodyMatch,
    WeakFuzzy,
    NotFound,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Unavailable => "unavailable",
            MatchTier::KeyMatch => "key_match",
            MatchTier::Fuzzy => "fuzzy",
            MatchTier::BodyMatch => "body_match",
            MatchTier::WeakFuzzy => "weak_fuzzy",
            MatchTier::NotFound => "not_found",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution, with enough detail to explain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub tier: MatchTier,
    /// Key of the returned section; `None` for fallback strings.
    pub key: Option<String>,
    /// Fuzzy score of the returned section (0.0 outside the fuzzy tiers).
    pub score: f64,
    /// Section text or fallback sentence.
    pub text: String,
}

impl Resolution {
    fn fallback(tier: MatchTier, text: &str) -> Self {
        Self {
            tier,
            key: None,
            score: 0.0,
            text: text.to_string(),
        }
    }

    fn section(tier: MatchTier, key: &str, score: f64, text: &str) -> Self {
        Self {
            tier,
            key: Some(key.to_string()),
            score,
            text: text.to_string(),
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Lowercases and trims a raw query.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase().trim().to_string()
}

/// Splits a normalized query into words.
///
/// An empty query yields a single empty word, which every key contains.
pub fn query_words(query: &str) -> Vec<&str> {
    if query.is_empty() {
        vec![""]
    } else {
        query.split_whitespace().collect()
    }
}

/// Scores one section key against the query words.
pub fn score_key(query_words: &[&str], key: &str) -> f64 {
    let mut score = 0.0;
    for query_word in query_words {
        let prefix = leading_chars(query_word, PREFIX_LEN);
        let earns_prefix = query_word.chars().count() >= MIN_WORD_LEN_FOR_PREFIX;
        for key_word in key.split_whitespace() {
            if key_word.contains(*query_word) || query_word.contains(key_word) {
                score += CONTAINMENT_POINTS;
            }
            if earns_prefix && key_word.contains(prefix) {
                score += PREFIX_BONUS_POINTS;
            }
        }
    }
    score
}

fn leading_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Resolves a query to a section text or a fallback sentence.
pub fn resolve(query: &str, index: &SectionIndex) -> String {
    resolve_detailed(query, index, &ResolveOptions::default()).into_text()
}

/// Resolves a query and reports which tier answered.
pub fn resolve_detailed(query: &str, index: &SectionIndex, opts: &ResolveOptions) -> Resolution {
    if index.is_empty() {
        return Resolution::fallback(MatchTier::Unavailable, NOT_AVAILABLE);
    }

    let query = normalize_query(query);
    let words = query_words(&query);

    // Tier 1: a query word inside a key.
    for section in index.iter() {
        if words.iter().any(|w| section.key.contains(*w)) {
            return Resolution::section(MatchTier::KeyMatch, &section.key, 0.0, &section.text);
        }
    }

    // Tier 2: scored overlap between query words and key words.
    let mut best: Option<(&str, &str)> = None;
    let mut best_score = 0.0;
    for section in index.iter() {
        let score = score_key(&words, &section.key);
        if score > best_score {
            best_score = score;
            best = Some((section.key.as_str(), section.text.as_str()));
        }
    }

    if let Some((key, text)) = best {
        if best_score >= FUZZY_THRESHOLD {
            return Resolution::section(MatchTier::Fuzzy, key, best_score, text);
        }
    }

    // Tier 3: whole query inside a section body.
    for section in index.iter() {
        if section.text.to_lowercase().contains(&query) {
            return Resolution::section(MatchTier::BodyMatch, &section.key, 0.0, &section.text);
        }
    }

    match best {
        Some((key, text)) if !opts.strict_threshold => {
            Resolution::section(MatchTier::WeakFuzzy, key, best_score, text)
        }
        _ => Resolution::fallback(MatchTier::NotFound, NO_GUIDANCE),
    }
}
