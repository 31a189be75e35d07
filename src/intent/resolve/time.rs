use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::MeetingTime;

const DEFAULT_MEETING_HOURS: u32 = 1;
const LAST_HOUR: u32 = 23;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    pub time: MeetingTime,
    pub consumed: String,
}

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?P<prefix>\b(?P<opener>um|at|ab|von|from)\s+)?
        \b(?P<hour>2[0-3]|[01]?\d)(?::(?P<minute>[0-5]\d))?
        (?P<unit>\s*(?:uhr|h|o'clock)\b)?",
    )
    .expect("valid clock time regex")
});

/// The end of a range right after a start time: "bis 17 Uhr", "- 16:30".
static RANGE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*(?:bis|until|to|-|–)\s*
        (?P<hour>2[0-3]|[01]?\d)(?::(?P<minute>[0-5]\d))?
        (?P<unit>\s*(?:uhr|h|o'clock)\b)?",
    )
    .expect("valid range end regex")
});

fn hour_minute(caps: &regex::Captures<'_>) -> Option<(u32, u32)> {
    let hour = caps["hour"].parse().ok()?;
    let minute = caps
        .name("minute")
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some((hour, minute))
}

/// True when `rest` carries on a number, as in "20" of "2025-06-12" or "10.06.".
fn continues_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Find a clock time (`15:30`, `um 9 Uhr`, `von 15 bis 17 Uhr`). Without an
/// explicit end the slot lasts one hour.
///
/// A bare number only counts as an hour when it is introduced by "um"/"at",
/// followed by an hour word or by a range end, so counts like "3 Aufgaben"
/// are ignored.
pub fn resolve_time(text: &str) -> Option<TimeMatch> {
    for caps in CLOCK_TIME.captures_iter(text) {
        let whole = caps.get(0)?;
        let rest = &text[whole.end()..];
        let range_opener = caps
            .name("opener")
            .is_some_and(|o| matches!(o.as_str().to_lowercase().as_str(), "von" | "from"));
        // "3-5" is a page range, "von 3 bis 5" or "3 bis 5 Uhr" a time range.
        let range_end = RANGE_END.captures(rest).filter(|r| {
            let after = r.get(0).map_or("", |m| &rest[m.end()..]);
            (range_opener || r.name("unit").is_some() || r.name("minute").is_some())
                && !continues_number(after)
        });
        let explicit = (caps.name("opener").is_some() && !range_opener)
            || caps.name("minute").is_some()
            || caps.name("unit").is_some()
            || range_end.is_some();
        if !explicit {
            continue;
        }
        // Skip longer numbers and the day part of "10.06." style dates.
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if rest.starts_with('.') && caps.name("unit").is_none() {
            continue;
        }
        let (hour, minute) = hour_minute(&caps)?;
        let default_end = ((hour + DEFAULT_MEETING_HOURS).min(LAST_HOUR), minute);
        let (end, consumed_end) = match range_end.as_ref().and_then(|r| Some((hour_minute(r)?, r.get(0)?))) {
            Some((end, m)) if end > (hour, minute) => (end, whole.end() + m.end()),
            _ => (default_end, whole.end()),
        };
        return Some(TimeMatch {
            time: MeetingTime {
                start: format!("{hour:02}:{minute:02}"),
                end: format!("{:02}:{:02}", end.0, end.1),
            },
            consumed: text[whole.start()..consumed_end].to_string(),
        });
    }
    None
}
