use std::ops::Range;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::kernel::time::next_weekday;

/// Result of scanning text for a date phrase.
///
/// When nothing matched, `date` is `today` and `consumed` is empty; callers
/// must use `found()` to tell "not mentioned" apart from "said today".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub consumed: String,
    pub span: Option<Range<usize>>,
}

impl DateMatch {
    pub fn found(&self) -> bool {
        !self.consumed.is_empty()
    }
}

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid iso date regex"));

static GERMAN_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})?").expect("valid german date regex")
});

static IN_DAYS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|in\s+the\s+next)\s+(?P<n>\d{1,3}|einem|einer|one|a)\s+(?P<unit>tag(?:en)?|days?|wochen?|weeks?)\b")
        .expect("valid relative days regex")
});

static DAY_AFTER_TOMORROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:übermorgen|uebermorgen|day after tomorrow)\b")
        .expect("valid day-after-tomorrow regex")
});

static TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:auf\s+)?(?:morgen|tomorrow)\b").expect("valid tomorrow regex"));

static TODAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:heute|today)\b").expect("valid today regex"));

static NEXT_WEEK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:(?:nächste|naechste|kommende)\s+woche|next\s+week)\b")
        .expect("valid next-week regex")
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:(?:am|nächsten|naechsten|kommenden|diesen|on|next)\s+)*
        (?P<day>montag|dienstag|mittwoch|donnerstag|freitag|samstag|sonntag
              |monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("valid weekday regex")
});

pub fn parse_weekday(word: &str) -> Option<Weekday> {
    match word.to_lowercase().as_str() {
        "montag" | "monday" => Some(Weekday::Mon),
        "dienstag" | "tuesday" => Some(Weekday::Tue),
        "mittwoch" | "wednesday" => Some(Weekday::Wed),
        "donnerstag" | "thursday" => Some(Weekday::Thu),
        "freitag" | "friday" => Some(Weekday::Fri),
        "samstag" | "saturday" => Some(Weekday::Sat),
        "sonntag" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn hit(date: NaiveDate, text: &str, range: Range<usize>) -> DateMatch {
    DateMatch {
        date,
        consumed: text[range.clone()].to_string(),
        span: Some(range),
    }
}

/// "in 3 Tagen", "in einer Woche".
fn relative_days(text: &str, today: NaiveDate) -> Option<DateMatch> {
    let caps = IN_DAYS.captures(text)?;
    let whole = caps.get(0)?;
    let count: i64 = match caps["n"].to_lowercase().as_str() {
        "einem" | "einer" | "one" | "a" => 1,
        n => n.parse().ok()?,
    };
    let unit = caps["unit"].to_lowercase();
    let days = if unit.starts_with("woche") || unit.starts_with("week") {
        count * 7
    } else {
        count
    };
    let date = today.checked_add_signed(Duration::days(days))?;
    Some(hit(date, text, whole.range()))
}

fn german_date(text: &str, today: NaiveDate) -> Option<DateMatch> {
    let caps = GERMAN_DATE.captures(text)?;
    let whole = caps.get(0)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
        Some(y) => y.as_str().parse().ok()?,
        None => {
            // A bare "DD.MM." that already passed this year means next year.
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year < today {
                today.year() + 1
            } else {
                today.year()
            }
        }
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(hit(date, text, whole.range()))
}

/// Find the first date phrase in `text`, relative to `today`.
pub fn resolve_date(text: &str, today: NaiveDate) -> DateMatch {
    if let Some(caps) = ISO_DATE.captures(text) {
        let parsed = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        );
        if let (Ok(y), Ok(m), Ok(d)) = parsed {
            if let (Some(date), Some(whole)) = (NaiveDate::from_ymd_opt(y, m, d), caps.get(0)) {
                return hit(date, text, whole.range());
            }
        }
    }

    if let Some(found) = german_date(text, today) {
        return found;
    }

    if let Some(found) = relative_days(text, today) {
        return found;
    }

    if let Some(m) = DAY_AFTER_TOMORROW.find(text) {
        return hit(today + Duration::days(2), text, m.range());
    }
    if let Some(m) = TOMORROW.find(text) {
        return hit(today + Duration::days(1), text, m.range());
    }
    if let Some(m) = TODAY.find(text) {
        return hit(today, text, m.range());
    }
    if let Some(m) = NEXT_WEEK.find(text) {
        return hit(next_weekday(today, Weekday::Mon), text, m.range());
    }
    if let Some(caps) = WEEKDAY.captures(text) {
        if let (Some(whole), Some(weekday)) = (caps.get(0), parse_weekday(&caps["day"])) {
            return hit(next_weekday(today, weekday), text, whole.range());
        }
    }

    DateMatch {
        date: today,
        consumed: String::new(),
        span: None,
    }
}
