//! One scorer per intent family.
//!
//! Every scorer is a pure `fn(&ScoringInput) -> Option<ScoredCandidate>`.
//! Scores are additive: a base weight from the primary pattern table, plus
//! `SECONDARY_BONUS` per matched secondary signal, plus `SYNONYM_BONUS` per
//! matched synonym group, clamped to `[0, 1]`.

mod create;
mod modify;
mod patterns;
mod query;

pub use create::{score_create_task, score_recurring_task};
pub use modify::{score_create_template, score_delete, score_move, score_set_priority};
pub use patterns::{score_pattern_action, score_pattern_query};
pub use query::{score_explain, score_stats_query};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{has_pronoun_reference, ConversationContext};
use super::resolve::count_matching;
use super::types::{ScoredCandidate, TaskScope};
use crate::model::{Client, Priority};

pub const SECONDARY_BONUS: f32 = 0.05;
pub const SYNONYM_BONUS: f32 = 0.03;

/// Everything a scorer may look at. Built once per parse call.
#[derive(Debug, Clone)]
pub struct ScoringInput<'a> {
    /// Trimmed user text with original casing, used for title extraction.
    pub raw: &'a str,
    /// Lower-cased `raw`, used for synonym matching.
    pub normalized: String,
    pub today: NaiveDate,
    pub clients: &'a [Client],
    pub context: &'a ConversationContext,
}

impl<'a> ScoringInput<'a> {
    pub fn new(
        text: &'a str,
        today: NaiveDate,
        clients: &'a [Client],
        context: &'a ConversationContext,
    ) -> Self {
        let raw = text.trim();
        Self {
            raw,
            normalized: raw.to_lowercase(),
            today,
            clients,
            context,
        }
    }
}

pub type Scorer = fn(&ScoringInput) -> Option<ScoredCandidate>;

/// All scorers, in a fixed order. Ties keep this order.
pub const SCORERS: &[(&str, Scorer)] = &[
    ("create_task", score_create_task),
    ("create_recurring_task", score_recurring_task),
    ("move_tasks", score_move),
    ("set_priority", score_set_priority),
    ("delete_task", score_delete),
    ("create_template", score_create_template),
    ("stats_query", score_stats_query),
    ("explain_capabilities", score_explain),
    ("pattern_query", score_pattern_query),
    ("pattern_action", score_pattern_action),
];

/// Additive score accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(f32);

impl Score {
    pub fn base(weight: f32) -> Self {
        Self(weight)
    }

    pub fn secondary(self, matched: bool) -> Self {
        if matched {
            Self(self.0 + SECONDARY_BONUS)
        } else {
            self
        }
    }

    pub fn synonyms(self, normalized: &str, groups: &[&str]) -> Self {
        Self(self.0 + SYNONYM_BONUS * count_matching(normalized, groups) as f32)
    }

    pub fn value(self) -> f32 {
        self.0.clamp(0.0, 1.0)
    }
}

/// Precompiled `(pattern, base weight)` table.
pub struct PatternTable(Vec<(Regex, f32)>);

impl PatternTable {
    pub fn compile(entries: &[(&str, f32)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(pattern, weight)| (Regex::new(pattern).expect("valid scorer regex"), *weight))
                .collect(),
        )
    }

    /// Highest weight among matching patterns.
    pub fn base(&self, text: &str) -> Option<f32> {
        self.0
            .iter()
            .filter(|(re, _)| re.is_match(text))
            .map(|(_, w)| *w)
            .reduce(f32::max)
    }
}

static PRIORITY_URGENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:dringend|urgent|sofort|asap)\b").expect("valid regex"));
static PRIORITY_HIGH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:hohe[rn]?\s+prio(?:rität)?|prio(?:rität)?\s+(?:auf\s+)?hoch|(?:auf\s+)?hoch|(?:sehr\s+)?wichtig|high(?:\s+priority)?|important)\b",
    )
    .expect("valid regex")
});
static PRIORITY_MEDIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:mittlere[rn]?\s+prio(?:rität)?|prio(?:rität)?\s+(?:auf\s+)?(?:mittel|normal)|mittel|normal|medium)\b")
        .expect("valid regex")
});
static PRIORITY_LOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:niedrige[rn]?\s+prio(?:rität)?|prio(?:rität)?\s+(?:auf\s+)?niedrig|niedrig|unwichtig|low(?:\s+priority)?)\b")
        .expect("valid regex")
});

/// Priority level named in `text`, with the matched phrase.
pub fn detect_priority(text: &str) -> Option<(Priority, String)> {
    // Most specific level first.
    let table: [(&Lazy<Regex>, Priority); 4] = [
        (&PRIORITY_URGENT, Priority::Urgent),
        (&PRIORITY_LOW, Priority::Low),
        (&PRIORITY_HIGH, Priority::High),
        (&PRIORITY_MEDIUM, Priority::Medium),
    ];
    table
        .iter()
        .find_map(|(re, p)| re.find(text).map(|m| (*p, m.as_str().to_string())))
}

static LAST_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:die\s+letzte|den\s+letzten|letzte\s+aufgabe|the\s+last\s+one|last\s+task)\b")
        .expect("valid regex")
});

const EDGE_FILLERS: &[&str] = &[
    "die", "den", "das", "der", "dem", "ein", "eine", "einen", "aufgabe", "task", "todo", "bitte",
    "mal", "doch", "please", "the", "a", "von", "aus", "zu", "zur", "zum", "als", "auf", "nach",
    "to", "for", "für", "mir", "mit", "noch", "jetzt", "dann", "priorität", "prio", "on", "of",
];

fn is_filler(word: &str) -> bool {
    let w = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    w.is_empty() || EDGE_FILLERS.contains(&w.as_str())
}

/// Drop filler words from both ends, keeping inner words intact.
pub fn trim_fillers(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.iter().position(|w| !is_filler(w)).unwrap_or(words.len());
    let end = words
        .iter()
        .rposition(|w| !is_filler(w))
        .map_or(start, |i| i + 1);
    words[start..end.max(start)].join(" ")
}

/// Remove the first occurrence of each phrase, then collapse whitespace.
pub fn strip_phrases(text: &str, phrases: &[&str]) -> String {
    let mut out = text.to_string();
    for phrase in phrases.iter().filter(|p| !p.is_empty()) {
        out = out.replacen(phrase, " ", 1);
    }
    collapse(&out)
}

pub fn strip_regex(text: &str, re: &Regex) -> String {
    collapse(&re.replace(text, " "))
}

pub fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a client mention plus its preposition ("mit Acme", "für Acme").
pub fn strip_client(text: &str, name: &str) -> String {
    let pattern = format!(
        r"(?i)(?:\b(?:mit|für|bei|von|for|with)\s+)?(?:(?:dem\s+)?kunden?\s+)?\b{}\b",
        regex::escape(name)
    );
    match Regex::new(&pattern) {
        Ok(re) => strip_regex(text, &re),
        Err(_) => text.to_string(),
    }
}

/// Target scope from whatever is left after removing the command words.
pub fn scope_from_remainder(remainder: &str) -> TaskScope {
    if LAST_REFERENCE.is_match(remainder) || has_pronoun_reference(remainder) {
        return TaskScope::Last;
    }
    let title = trim_fillers(remainder);
    let title = title.trim_matches(|c: char| c == '"' || c == '„' || c == '“' || c == '\'');
    if title.is_empty() {
        TaskScope::Last
    } else {
        TaskScope::ByTitle(title.to_string())
    }
}

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["„“]([^"„“]+)["“]"#).expect("valid quoted regex"));

pub fn quoted(text: &str) -> Option<String> {
    QUOTED
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
