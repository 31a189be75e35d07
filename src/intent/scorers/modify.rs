use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{
    detect_priority, quoted, scope_from_remainder, strip_phrases, strip_regex, PatternTable, Score,
    ScoringInput,
};
use crate::intent::resolve::resolve_date;
use crate::intent::types::{Intent, MoveScope, ScoredCandidate, TaskScope};

static MOVE_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)^(?:bitte\s+)?(?:verschiebe|verschieb|schiebe|schieb|verlege|verleg|move|postpone|reschedule)\b",
            0.9,
        ),
        (r"(?i)\b(?:verschieben|verlegen|auf\s+später)\b", 0.7),
    ])
});

static MOVE_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:bitte\s+)?(?:verschiebe|verschieb|schiebe|schieb|verlege|verleg|move|postpone|reschedule)\b
        |\b(?:verschieben|verlegen)\b",
    )
    .expect("valid move verb regex")
});

static ALL_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:alle(?:s)?(?:\s+(?:offenen|restlichen|übrigen))?(?:\s+(?:aufgaben|tasks|todos))?|die\s+(?:offenen|restlichen|übrigen)(?:\s+aufgaben)?|restlichen\s+aufgaben|everything|all(?:\s+(?:open|remaining))?(?:\s+tasks)?)\b",
    )
    .expect("valid all-open regex")
});

pub fn score_move(input: &ScoringInput) -> Option<ScoredCandidate> {
    let base = MOVE_PRIMARY.base(input.raw)?;

    let date = resolve_date(input.raw, input.today);
    let all_open = ALL_OPEN.find(input.raw);
    let target_date = if date.found() {
        date.date
    } else {
        input.today + Duration::days(1)
    };

    let scope = match all_open {
        Some(_) => MoveScope::AllOpen,
        None => {
            let rest = strip_regex(input.raw, &MOVE_VERB);
            let rest = strip_phrases(&rest, &[date.consumed.as_str()]);
            let rest = strip_regex(&rest, &LATER);
            MoveScope::Task(match quoted(input.raw) {
                Some(q) => TaskScope::ByTitle(q),
                None => scope_from_remainder(&rest),
            })
        }
    };

    let confidence = Score::base(base)
        .secondary(date.found())
        .secondary(all_open.is_some())
        .synonyms(&input.normalized, &["move"])
        .value();
    debug!(scorer = "move_tasks", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::MoveTasks {
            scope,
            from_date: input.today,
            target_date,
            confidence,
        },
        confidence,
    ))
}

static LATER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:auf\s+)?(?:später|later)\b").expect("valid later regex"));

static PRIORITY_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (r"(?i)\b(?:prio(?:rität|risiere)?|priority|prioritize)\b", 0.9),
        (
            r"(?i)^(?:bitte\s+)?(?:markiere|markier|mach|mache|setze|setz|mark|make|set)\b.*\b(?:wichtig|dringend|unwichtig|urgent|important)\b",
            0.8,
        ),
        (r"(?i)\b(?:ist|is)\s+(?:sehr\s+)?(?:wichtig|dringend|unwichtig|urgent|important)\b", 0.6),
    ])
});

static PRIORITY_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:bitte\s+)?(?:markiere|markier|mach|mache|setze|setz|ändere|änder|priorisiere|mark|make|set|change|prioritize)\b
        |\b(?:ist|is|als|auf|to|as)\b
        |\b(?:die\s+)?(?:prio(?:rität)?|priority)\b
        |\b(?:von|of|for)\b",
    )
    .expect("valid priority command regex")
});

static CREATE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:bitte\s+)?(?:erstelle|erstell|lege|leg|füge|notiere|create|add|neue[nrs]?)\b")
        .expect("valid create start regex")
});

static OPTIONAL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\boptional\b").expect("valid optional regex"));

pub fn score_set_priority(input: &ScoringInput) -> Option<ScoredCandidate> {
    if CREATE_START.is_match(input.raw) || OPTIONAL_WORD.is_match(input.raw) {
        return None;
    }
    let (priority, phrase) = detect_priority(input.raw)?;
    let base = PRIORITY_PRIMARY.base(input.raw)?;

    let scope = match quoted(input.raw) {
        Some(q) => TaskScope::ByTitle(q),
        None => {
            let rest = strip_phrases(input.raw, &[phrase.as_str()]);
            let rest = PRIORITY_COMMAND.replace_all(&rest, " ");
            scope_from_remainder(&rest)
        }
    };

    let confidence = Score::base(base)
        .secondary(!matches!(scope, TaskScope::Last))
        .synonyms(&input.normalized, &["priority"])
        .value();
    debug!(scorer = "set_priority", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::SetPriority {
            scope,
            priority,
            confidence,
        },
        confidence,
    ))
}

static DELETE_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)^(?:bitte\s+)?(?:lösche|lösch|entferne|entfern|streiche|streich|delete|remove|discard)\b",
            0.9,
        ),
        (r"(?i)\b(?:löschen|entfernen|streichen)\s*[.!]?\s*$", 0.7),
        (r"(?i)\bweg\s+damit\b", 0.5),
    ])
});

static DELETE_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:bitte\s+)?(?:lösche|lösch|entferne|entfern|streiche|streich|delete|remove|discard)\b
        |\b(?:löschen|entfernen|streichen)\b
        |\bweg\s+damit\b",
    )
    .expect("valid delete verb regex")
});

pub fn score_delete(input: &ScoringInput) -> Option<ScoredCandidate> {
    if OPTIONAL_WORD.is_match(input.raw) {
        return None;
    }
    let base = DELETE_PRIMARY.base(input.raw)?;

    let scope = match quoted(input.raw) {
        Some(q) => TaskScope::ByTitle(q),
        None => scope_from_remainder(&DELETE_VERB.replace_all(input.raw, " ")),
    };

    let confidence = Score::base(base)
        .secondary(!matches!(scope, TaskScope::Last))
        .synonyms(&input.normalized, &["delete"])
        .value();
    debug!(scorer = "delete_task", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::DeleteTask { scope, confidence },
        confidence,
    ))
}

static TEMPLATE_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (r"(?i)\b(?:als|zur|zu\s+einer|as\s+a?)\s*(?:vorlage|template)\b", 0.9),
        (
            r"(?i)^(?:bitte\s+)?(?:erstelle|erstell|mach|mache|speichere|speicher|create|make|save)\b.*\b(?:vorlage|template)\b",
            0.85,
        ),
        (r"(?i)\b(?:vorlage|template)\b", 0.55),
    ])
});

static TEMPLATE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:namens|mit\s+dem\s+namen|called|named)\s+(?P<name>.+?)\s*[.!]?\s*$")
        .expect("valid template name regex")
});

static TEMPLATE_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:aus|von|from)\s+(?P<source>.+?)
        (?:
            \s+(?:(?:als|zur|zu\s+einer|as)\s+)?(?:eine?\s+|a\s+|neue\s+)?(?:vorlage|template)\b.*
          | \s+(?:namens|mit\s+dem\s+namen|called|named)\b.*
        )?
        \s*[.!]?\s*$",
    )
    .expect("valid template source regex")
});

static TEMPLATE_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:bitte\s+)?(?:erstelle|erstell|mach|mache|speichere|speicher|create|make|save)\b
        |\b(?:als|zur|zu\s+einer|as\s+a?)?\s*(?:neue\s+)?(?:vorlage|template)\b
        |\b(?:speichern|sichern|save)\b
        |\b(?:namens|mit\s+dem\s+namen|called|named)\b.*$",
    )
    .expect("valid template command regex")
});

pub fn score_create_template(input: &ScoringInput) -> Option<ScoredCandidate> {
    let base = TEMPLATE_PRIMARY.base(input.raw)?;

    let name = TEMPLATE_NAME
        .captures(input.raw)
        .map(|c| c["name"].trim_matches(|ch: char| ch == '"' || ch == '„' || ch == '“').to_string())
        .filter(|n| !n.is_empty());

    let scope = match TEMPLATE_SOURCE.captures(input.raw) {
        Some(caps) => scope_from_remainder(&caps["source"]),
        None => scope_from_remainder(&TEMPLATE_COMMAND.replace_all(input.raw, " ")),
    };

    let confidence = Score::base(base)
        .secondary(name.is_some())
        .secondary(!matches!(scope, TaskScope::Last))
        .synonyms(&input.normalized, &["template", "create"])
        .value();
    debug!(scorer = "create_template", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::CreateTemplate {
            scope,
            name,
            confidence,
        },
        confidence,
    ))
}
