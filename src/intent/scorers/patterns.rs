use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{quoted, scope_from_remainder, PatternTable, Score, ScoringInput};
use crate::intent::types::{Intent, PatternActionType, PatternQueryType, ScoredCandidate, TaskScope};

static PATTERN_QUERY_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)\b(?:welche|zeig\w*|liste\w*|gibt\s+es|show|list|any)\b.*\b(?:muster|patterns?|auffälligkeiten|gewohnheiten)\b",
            0.85,
        ),
        (
            r"(?i)\b(?:muster|patterns?|auffälligkeiten|gewohnheiten)\b.*\?\s*$",
            0.8,
        ),
        (r"(?i)\b(?:muster|patterns?|auffälligkeiten)\b", 0.75),
    ])
});

static QUERY_POSTPONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:verschob\w*|verschieb\w*|aufgeschoben\w*|postpone\w*)\b")
        .expect("valid postpone query regex")
});
static QUERY_DEADLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:deadlines?|fristen|frist|fällig\w*|due)\b").expect("valid deadline query regex")
});
static QUERY_CLIENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:kunde\w*|client\w*)\b").expect("valid client query regex")
});

pub fn score_pattern_query(input: &ScoringInput) -> Option<ScoredCandidate> {
    let base = PATTERN_QUERY_PRIMARY.base(input.raw)?;

    let query = if QUERY_POSTPONE.is_match(input.raw) {
        PatternQueryType::Postpone
    } else if QUERY_DEADLINE.is_match(input.raw) {
        PatternQueryType::DeadlineWarning
    } else if QUERY_CLIENT.is_match(input.raw) {
        PatternQueryType::AutoClient
    } else {
        PatternQueryType::All
    };

    let confidence = Score::base(base)
        .secondary(query != PatternQueryType::All)
        .synonyms(&input.normalized, &["pattern", "question"])
        .value();
    debug!(scorer = "pattern_query", confidence, ?query, "candidate");
    Some(ScoredCandidate::new(
        Intent::PatternQuery { query, confidence },
        confidence,
    ))
}

static MARK_OPTIONAL: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)^(?:bitte\s+)?(?:markiere|markier|mach|mache|setze|setz|mark|make|set)\b.*\boptional\b",
            0.85,
        ),
        (r"(?i)\b(?:ist\s+optional|als\s+optional|is\s+optional)\b", 0.75),
        (r"(?i)\b(?:optional|kann\s+warten|nicht\s+so\s+wichtig)\b", 0.6),
    ])
});

static DEPRIORITIZE: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[(
        r"(?i)\b(?:depriorisier\w*|deprioriti[sz]e\w*|runterstuf\w*|herabstuf\w*|priorität\s+senken|senke\s+die\s+priorität)\b",
        0.85,
    )])
});

static ACCEPT_CLIENT: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)\b(?:kunden?|client)\s+(?:zuordnen|zuweisen|übernehmen|akzeptieren|setzen)\b|\b(?:ordne|weise)\b.*\b(?:kunden?|client)\b.*\bzu\b|\b(?:accept|assign)\s+(?:the\s+)?client\b",
            0.85,
        ),
        (r"(?i)\b(?:kundenvorschlag|client\s+suggestion)\b", 0.7),
    ])
});

static ACTION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:bitte\s+)?(?:markiere|markier|mach|mache|setze|setz|senke|ordne|weise|mark|make|set|accept|assign)\b
        |\b(?:als|ist|is|as|zu)\b
        |\b(?:optional|kann\s+warten|nicht\s+so\s+wichtig)\b
        |\b(?:depriorisier\w*|deprioriti[sz]e\w*|runterstuf\w*|herabstuf\w*|priorität\s+senken|die\s+priorität)\b
        |\b(?:(?:den\s+)?kunden?|(?:the\s+)?client)(?:\s+(?:zuordnen|zuweisen|übernehmen|akzeptieren|setzen|suggestion))?\b
        |\bkundenvorschlag\b",
    )
    .expect("valid pattern action regex")
});

pub fn score_pattern_action(input: &ScoringInput) -> Option<ScoredCandidate> {
    let ranked = [
        (PatternActionType::AcceptClient, ACCEPT_CLIENT.base(input.raw)),
        (PatternActionType::Deprioritize, DEPRIORITIZE.base(input.raw)),
        (PatternActionType::MarkOptional, MARK_OPTIONAL.base(input.raw)),
    ];
    let (action, base) = ranked
        .into_iter()
        .filter_map(|(action, base)| base.map(|b| (action, b)))
        .reduce(|best, next| if next.1 > best.1 { next } else { best })?;

    let scope = match quoted(input.raw) {
        Some(q) => TaskScope::ByTitle(q),
        None => scope_from_remainder(&ACTION_WORDS.replace_all(input.raw, " ")),
    };

    let confidence = Score::base(base)
        .secondary(!matches!(scope, TaskScope::Last))
        .synonyms(&input.normalized, &["pattern", "optional"])
        .value();
    debug!(scorer = "pattern_action", confidence, ?action, "candidate");
    Some(ScoredCandidate::new(
        Intent::PatternAction {
            action,
            scope,
            confidence,
        },
        confidence,
    ))
}
