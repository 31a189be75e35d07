use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{PatternTable, Score, ScoringInput};
use crate::intent::types::{Intent, ScoredCandidate, StatsQueryType};

static QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\?\s*$|^(?:was|wie|wann|welche[rsmn]?|wer|wo|gibt\s+es|habe\s+ich|hab\s+ich|what|how|which|when|do\s+i|have\s+i)\b)")
        .expect("valid question regex")
});

static SHOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:zeig\w*|liste\w*|list|show|übersicht|statistik\w*|stats|overview)\b")
        .expect("valid show regex")
});

static MUTATION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:bitte\s+)?(?:erstelle|erstell|lege|leg|füge|notiere|verschiebe|verschieb|schiebe|verlege|lösche|lösch|entferne|streiche|markiere|markier|setze|setz|mach|mache|create|add|move|postpone|delete|remove|mark|set|make)\b",
    )
    .expect("valid mutation start regex")
});

/// `(query, pattern)` in specificity order: the first match decides.
static STATS_TABLE: Lazy<Vec<(StatsQueryType, Regex)>> = Lazy::new(|| {
    let entries: [(StatsQueryType, &str); 14] = [
        (
            StatsQueryType::LastCompleted,
            r"(?i)\b(?:zuletzt\s+(?:erledigt|abgeschlossen|geschafft)|letzte\s+erledigte|last\s+(?:completed|finished|done))\b",
        ),
        (
            StatsQueryType::WorkTimeMonth,
            r"(?i)\b(?:arbeitszeit|gearbeitet|stunden|work\s*time|worked|hours)\b.*\b(?:monat|month)\b|\b(?:monat|month)\b.*\b(?:arbeitszeit|gearbeitet|work\s*time|worked)\b",
        ),
        (
            StatsQueryType::WorkTimeWeek,
            r"(?i)\b(?:arbeitszeit|gearbeitet|stunden|work\s*time|worked|hours)\b.*\b(?:woche|week)\b|\b(?:woche|week)\b.*\b(?:arbeitszeit|gearbeitet|work\s*time|worked)\b",
        ),
        (
            StatsQueryType::WorkTimeToday,
            r"(?i)\b(?:arbeitszeit|gearbeitet|work\s*time|worked|erfasste\s+zeit|tracked\s+time)\b",
        ),
        (
            StatsQueryType::CompletionRateWeek,
            r"(?i)\b(?:quote|erledigungsquote|fortschritt|geschafft|completion\s+rate|progress)\b.*\b(?:woche|week)\b|\b(?:woche|week)\b.*\b(?:quote|geschafft|completion\s+rate|progress)\b",
        ),
        (
            StatsQueryType::CompletionRateToday,
            r"(?i)\b(?:quote|erledigungsquote|fortschritt|geschafft|completion\s+rate|progress)\b",
        ),
        (
            StatsQueryType::OverdueTasks,
            r"(?i)\b(?:überfällig\w*|ueberfaellig\w*|liegengeblieben\w*|overdue|verpasst\w*)\b",
        ),
        (
            StatsQueryType::MeetingsToday,
            r"(?i)\b(?:meetings|termine|besprechungen|calls)\b",
        ),
        (
            StatsQueryType::HighPriorityTasks,
            r"(?i)\b(?:wichtige[n]?|dringende[n]?|hohe[rn]?\s+prio\w*|high[\s-]priority|urgent|important)\b",
        ),
        (
            StatsQueryType::ClientList,
            r"(?i)\b(?:kunden|klienten|clients|customers)\b",
        ),
        (
            StatsQueryType::OpenTaskCount,
            r"(?i)\b(?:wie\s*viele|anzahl|how\s+many)\b|\boffene[n]?\s+(?:aufgaben|tasks)\b",
        ),
        (
            StatsQueryType::TasksThisWeek,
            r"(?i)\b(?:diese|dieser|this)\s+woche\b|\bthis\s+week\b|\bwochenplan\b",
        ),
        (
            StatsQueryType::TasksTomorrow,
            r"(?i)\b(?:morgen|tomorrow)\b",
        ),
        (
            StatsQueryType::TasksToday,
            r"(?i)\b(?:heute|today|steht\s+an|tagesplan|agenda|was\s+(?:habe|hab)\s+ich|aufgaben|tasks)\b",
        ),
    ];
    entries
        .into_iter()
        .map(|(query, pattern)| (query, Regex::new(pattern).expect("valid stats regex")))
        .collect()
});

pub fn score_stats_query(input: &ScoringInput) -> Option<ScoredCandidate> {
    let question = QUESTION.is_match(input.raw);
    let show = SHOW.is_match(input.raw);
    if !question && !show && MUTATION_START.is_match(input.raw) {
        return None;
    }
    let query = STATS_TABLE
        .iter()
        .find(|(_, re)| re.is_match(input.raw))
        .map(|(query, _)| *query)?;

    let base = match (question, show) {
        (true, _) => 0.8,
        (false, true) => 0.75,
        (false, false) => 0.6,
    };
    // Mutation verbs with a question mark ("verschiebe ich das?") stay weak.
    let base = if MUTATION_START.is_match(input.raw) { 0.45 } else { base };

    let confidence = Score::base(base)
        .secondary(question && show)
        .synonyms(&input.normalized, &["question", "stats"])
        .value();
    debug!(scorer = "stats_query", confidence, ?query, "candidate");
    Some(ScoredCandidate::new(
        Intent::StatsQuery { query, confidence },
        confidence,
    ))
}

static EXPLAIN_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)\b(?:was\s+kannst\s+du|wie\s+funktionierst\s+du|was\s+verstehst\s+du|hilfe|help|what\s+can\s+you\s+do|befehle|commands)\b",
            0.9,
        ),
        (
            r"(?i)\b(?:funktionen|möglichkeiten|features|erkläre?\s+dich)\b",
            0.6,
        ),
    ])
});

pub fn score_explain(input: &ScoringInput) -> Option<ScoredCandidate> {
    let base = EXPLAIN_PRIMARY.base(input.raw)?;
    let confidence = Score::base(base)
        .synonyms(&input.normalized, &["help"])
        .value();
    debug!(scorer = "explain_capabilities", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::ExplainCapabilities { confidence },
        confidence,
    ))
}
