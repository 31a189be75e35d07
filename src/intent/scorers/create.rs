use chrono::{Datelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{
    capitalize, collapse, detect_priority, quoted, strip_client, strip_phrases, strip_regex,
    trim_fillers, PatternTable, Score, ScoringInput,
};
use crate::intent::resolve::date::parse_weekday;
use crate::intent::resolve::{match_client, resolve_date, resolve_time};
use crate::intent::types::{Intent, ScoredCandidate};
use crate::kernel::time::next_weekday;
use crate::model::{Recurrence, RecurrenceFrequency};

static CREATE_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)^(?:bitte\s+)?(?:erstelle|erstell|lege|leg|create|add)\s+(?:mir\s+)?(?:eine?n?\s+)?(?:neue[nrs]?\s+)?(?:aufgabe|task|todo|termin|meeting|besprechung)\b",
            0.95,
        ),
        (
            r"(?i)^(?:bitte\s+)?(?:neue[nrs]?\s+(?:aufgabe|task|todo|termin|meeting)|new\s+(?:task|meeting))\b",
            0.85,
        ),
        (
            r"(?i)^(?:bitte\s+)?(?:erstelle|erstell|füge|notiere|plane|create|add)\b",
            0.75,
        ),
        (
            r"(?i)\b(?:aufgabe|task|termin|meeting)\b.*\b(?:anlegen|hinzufügen|erstellen|eintragen)\b",
            0.6,
        ),
        (
            r"(?i)^(?:ich\s+muss|muss\s+noch|erinnere\s+mich(?:\s+daran)?|remind\s+me\s+to)\b",
            0.5,
        ),
    ])
});

static COMMAND_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:bitte\s+)?
        (?:erstelle|erstell|lege|leg|füge|notiere|plane|create|add|new|neue[nrs]?
          |ich\s+muss|muss\s+noch|erinnere\s+mich(?:\s+daran)?|remind\s+me\s+to)\b\s*
        (?:mir\s+)?(?:eine?n?\s+)?(?:neue[nrs]?\s+)?
        (?:(?:aufgabe|task|todo)\b\s*)?
        (?:(?:namens|called)\s+)?",
    )
    .expect("valid command prefix regex")
});

static COMMAND_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:an|hinzu|anlegen|hinzufügen|erstellen|eintragen|ein)\s*[.!]?\s*$")
        .expect("valid command suffix regex")
});

static MEETING_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:meeting|termin|besprechung|call|telko|jour\s+fixe)\b")
        .expect("valid meeting regex")
});

static DEADLINE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bis(?:\s+(?:zum|spätestens))?|deadline|fällig(?:\s+am)?|due(?:\s+on)?)\s*$")
        .expect("valid deadline marker regex")
});

static TEMPLATE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:vorlage|template)\b").expect("valid template regex"));

static RECURRENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:
            jeden\s+(?P<every_de>tag|werktag|monat|montag|dienstag|mittwoch|donnerstag|freitag|samstag|sonntag)
          | jede\s+woche
          | every\s+(?P<every_en>day|weekday|month|week|monday|tuesday|wednesday|thursday|friday|saturday|sunday)
          | (?P<adverb>täglich|werktags|wöchentlich|monatlich|daily|weekly|monthly)
        )\b",
    )
    .expect("valid recurrence regex")
});

fn title_or_default(title: String, is_meeting: bool, client_name: Option<&str>) -> String {
    let title = capitalize(title.trim_matches(|c: char| c == ',' || c == '.' || c == ':' || c.is_whitespace()));
    let bare_meeting = MEETING_WORD.is_match(&title) && title.split_whitespace().count() == 1;
    match (title.is_empty() || bare_meeting, is_meeting, client_name) {
        (true, true, Some(name)) => {
            let word = if title.is_empty() { "Meeting" } else { title.as_str() };
            format!("{word} mit {name}")
        }
        (true, true, None) if title.is_empty() => "Meeting".to_string(),
        (true, false, _) if title.is_empty() => "Neue Aufgabe".to_string(),
        _ => title,
    }
}

pub fn score_create_task(input: &ScoringInput) -> Option<ScoredCandidate> {
    if RECURRENCE.is_match(input.raw) || TEMPLATE_WORD.is_match(input.raw) {
        return None;
    }
    let base = CREATE_PRIMARY.base(input.raw)?;

    let date = resolve_date(input.raw, input.today);
    let time = resolve_time(input.raw);
    let client = match_client(input.raw, input.clients);
    let priority = detect_priority(input.raw);

    let deadline_marker = date
        .span
        .as_ref()
        .and_then(|span| DEADLINE_MARKER.find(&input.raw[..span.start]));
    let is_deadline = deadline_marker.is_some();
    let is_meeting = MEETING_WORD.is_match(input.raw) || time.is_some();

    let score = Score::base(base)
        .secondary(date.found())
        .secondary(time.is_some())
        .secondary(client.is_some())
        .secondary(priority.is_some())
        .secondary(is_deadline)
        .synonyms(&input.normalized, &["create", "meeting"]);

    let title = match quoted(input.raw) {
        Some(q) => q,
        None => {
            let mut rest = strip_regex(input.raw, &COMMAND_PREFIX);
            if let Some(marker) = deadline_marker {
                rest = strip_phrases(&rest, &[marker.as_str().trim()]);
            }
            rest = strip_phrases(&rest, &[date.consumed.as_str()]);
            if let Some(t) = &time {
                rest = strip_phrases(&rest, &[t.consumed.as_str()]);
            }
            if let Some((_, phrase)) = &priority {
                rest = strip_phrases(&rest, &[phrase.as_str()]);
            }
            if let Some(c) = client {
                rest = strip_client(&rest, &c.name);
            }
            rest = strip_regex(&rest, &COMMAND_SUFFIX);
            trim_fillers(&collapse(&rest))
        }
    };
    let title = title_or_default(title, is_meeting, client.map(|c| c.name.as_str()));

    let (scheduled, deadline) = if is_deadline {
        (input.today, Some(date.date))
    } else {
        (date.date, None)
    };

    let confidence = score.value();
    debug!(scorer = "create_task", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::CreateTask {
            title,
            date: scheduled,
            priority: priority.map(|(p, _)| p),
            client_id: client.map(|c| c.id.clone()),
            is_meeting,
            meeting_time: time.map(|t| t.time),
            deadline,
            confidence,
        },
        confidence,
    ))
}

static RECURRING_PRIMARY: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::compile(&[
        (
            r"(?i)^(?:bitte\s+)?(?:erstelle|erstell|lege|leg|füge|notiere|plane|create|add|neue[nrs]?)\b",
            0.9,
        ),
        (r"(?i)\b(?:wiederkehrend\w*|recurring|regelmäßig\w*)\b", 0.8),
    ])
});

fn recurrence_from(caps: &regex::Captures, today: chrono::NaiveDate) -> Recurrence {
    let word = caps
        .name("every_de")
        .or_else(|| caps.name("every_en"))
        .or_else(|| caps.name("adverb"))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| "woche".to_string());
    if let Some(weekday) = parse_weekday(&word) {
        return Recurrence {
            frequency: RecurrenceFrequency::Weekly,
            weekday: Some(weekday),
        };
    }
    let frequency = match word.as_str() {
        "tag" | "day" | "täglich" | "daily" => RecurrenceFrequency::Daily,
        "werktag" | "weekday" | "werktags" => RecurrenceFrequency::Weekdays,
        "monat" | "month" | "monatlich" | "monthly" => RecurrenceFrequency::Monthly,
        _ => RecurrenceFrequency::Weekly,
    };
    let weekday = match frequency {
        RecurrenceFrequency::Weekly => Some(today.weekday()),
        _ => None,
    };
    Recurrence { frequency, weekday }
}

fn first_occurrence(recurrence: &Recurrence, today: chrono::NaiveDate) -> chrono::NaiveDate {
    match (recurrence.frequency, recurrence.weekday) {
        (RecurrenceFrequency::Weekly, Some(day)) if day != today.weekday() => next_weekday(today, day),
        (RecurrenceFrequency::Weekdays, _) if matches!(today.weekday(), Weekday::Sat | Weekday::Sun) => {
            next_weekday(today, Weekday::Mon)
        }
        _ => today,
    }
}

pub fn score_recurring_task(input: &ScoringInput) -> Option<ScoredCandidate> {
    let caps = RECURRENCE.captures(input.raw)?;
    if TEMPLATE_WORD.is_match(input.raw) {
        return None;
    }
    // A recurrence phrase alone still reads as a request ("jeden Montag Teammeeting").
    let base = RECURRING_PRIMARY.base(input.raw).unwrap_or(0.65);

    let recurrence = recurrence_from(&caps, input.today);
    let time = resolve_time(input.raw);
    let client = match_client(input.raw, input.clients);
    let priority = detect_priority(input.raw);

    let score = Score::base(base)
        .secondary(time.is_some())
        .secondary(client.is_some())
        .secondary(priority.is_some())
        .synonyms(&input.normalized, &["create", "recurring", "meeting"]);

    let title = match quoted(input.raw) {
        Some(q) => q,
        None => {
            let mut rest = strip_regex(input.raw, &COMMAND_PREFIX);
            rest = strip_regex(&rest, &RECURRENCE);
            if let Some(t) = &time {
                rest = strip_phrases(&rest, &[t.consumed.as_str()]);
            }
            if let Some((_, phrase)) = &priority {
                rest = strip_phrases(&rest, &[phrase.as_str()]);
            }
            if let Some(c) = client {
                rest = strip_client(&rest, &c.name);
            }
            rest = strip_regex(&rest, &COMMAND_SUFFIX);
            trim_fillers(&rest)
        }
    };
    let is_meeting = MEETING_WORD.is_match(input.raw);
    let title = title_or_default(title, is_meeting, client.map(|c| c.name.as_str()));

    let confidence = score.value();
    debug!(scorer = "create_recurring_task", confidence, "candidate");
    Some(ScoredCandidate::new(
        Intent::CreateRecurringTask {
            title,
            start_date: first_occurrence(&recurrence, input.today),
            recurrence,
            priority: priority.map(|(p, _)| p),
            client_id: client.map(|c| c.id.clone()),
            confidence,
        },
        confidence,
    ))
}
