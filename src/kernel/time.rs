use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc, Weekday};

/// Source of "today" and "now". Decision logic never reads the wall clock
/// directly; it receives a `Moment` captured once per turn or scan.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate;

    fn moment(&self) -> Moment {
        Moment {
            today: self.today(),
            now: self.now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Frozen clock for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Moment);

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        let now = today
            .and_hms_opt(9, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self(Moment { today, now })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.now
    }

    fn today(&self) -> NaiveDate {
        self.0.today
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Next occurrence of `weekday` strictly after `from`.
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = from.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut delta = (target - current).rem_euclid(7);
    if delta == 0 {
        delta = 7;
    }
    from + Duration::days(delta)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}

/// Human label relative to `today`: "heute", "morgen", else "Freitag, 13.06.".
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    let diff = (date - today).num_days();
    match diff {
        0 => "heute".to_string(),
        1 => "morgen".to_string(),
        2 => "übermorgen".to_string(),
        -1 => "gestern".to_string(),
        _ => format!(
            "{}, {:02}.{:02}.",
            weekday_name(date.weekday()),
            date.day(),
            date.month()
        ),
    }
}

/// "2 Std. 15 Min." / "45 Min."
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours == 0 {
        format!("{rest} Min.")
    } else if rest == 0 {
        format!("{hours} Std.")
    } else {
        format!("{hours} Std. {rest} Min.")
    }
}
