//! Kickoff time windows derived from date keywords in user messages.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Look-ahead for open questions that name no date, team or tournament.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Half-open kickoff window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FixtureWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// From `now` until `days` days later.
    pub fn upcoming(now: DateTime<Utc>, days: i64) -> Self {
        Self::new(now, now + Duration::days(days))
    }

    /// Every kickoff from `now` on.
    pub fn open_ended(now: DateTime<Utc>) -> Self {
        Self::new(now, DateTime::<Utc>::MAX_UTC)
    }

    /// A whole UTC calendar day.
    pub fn day(date: NaiveDate) -> Self {
        let start = start_of(date);
        Self::new(start, start + Duration::days(1))
    }

    pub fn today(now: DateTime<Utc>) -> Self {
        Self::day(now.date_naive())
    }

    pub fn tomorrow(now: DateTime<Utc>) -> Self {
        Self::day(now.date_naive() + Duration::days(1))
    }

    /// The next Sunday, or today when today is a Sunday.
    pub fn sunday(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let ahead = (6 - today.weekday().num_days_from_monday()) as i64;
        Self::day(today + Duration::days(ahead))
    }

    /// Saturday through Sunday of the current or coming weekend.
    pub fn weekend(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let weekday = today.weekday().num_days_from_monday() as i64;
        let saturday = if weekday == 6 {
            today - Duration::days(1)
        } else {
            today + Duration::days(5 - weekday)
        };
        let start = start_of(saturday).max(start_of(today));
        Self::new(start, start_of(saturday + Duration::days(2)))
    }

    /// Derive a window from date keywords in `message`.
    ///
    /// Recognises "today", "tonight", "tomorrow", "sunday", "weekend" and
    /// `MM-DD` literals (read as `DD-MM` when the first part exceeds 12).
    /// `None` when the message names no date.
    pub fn from_message(message: &str, now: DateTime<Utc>) -> Option<Self> {
        let lower = message.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
            .collect();

        if words.iter().any(|w| *w == "today" || *w == "tonight") {
            return Some(Self::today(now));
        }
        if words.contains(&"tomorrow") {
            return Some(Self::tomorrow(now));
        }
        if words.iter().any(|w| *w == "weekend") {
            return Some(Self::weekend(now));
        }
        if words.iter().any(|w| *w == "sunday") {
            return Some(Self::sunday(now));
        }
        words
            .iter()
            .find_map(|w| parse_month_day(w, now.year()))
            .map(Self::day)
    }

    /// The window for a message: its date if it names one, otherwise every
    /// upcoming kickoff when the question is targeted at teams or tournaments,
    /// otherwise the default look-ahead.
    pub fn for_message(message: &str, now: DateTime<Utc>, targeted: bool) -> Self {
        match Self::from_message(message, now) {
            Some(window) => window,
            None if targeted => Self::open_ended(now),
            None => Self::upcoming(now, DEFAULT_WINDOW_DAYS),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn parse_month_day(word: &str, year: i32) -> Option<NaiveDate> {
    let (a, b) = word.split_once('-')?;
    if a.is_empty() || b.is_empty() || a.len() > 2 || b.len() > 2 {
        return None;
    }
    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    let (month, day) = if a > 12 { (b, a) } else { (a, b) };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Monday 2026-10-19 15:30 UTC
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 15, 30, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn tomorrow_covers_next_calendar_day() {
        let w = FixtureWindow::from_message("What matches are tomorrow?", monday()).unwrap();
        assert_eq!(w.start, date(2026, 10, 20));
        assert_eq!(w.end, date(2026, 10, 21));
    }

    #[test]
    fn weekend_from_monday_is_coming_saturday_and_sunday() {
        let w = FixtureWindow::from_message("most competitive match this weekend", monday()).unwrap();
        assert_eq!(w.start, date(2026, 10, 24));
        assert_eq!(w.end, date(2026, 10, 26));
    }

    #[test]
    fn weekend_on_sunday_is_rest_of_today() {
        let sunday = Utc.with_ymd_and_hms(2026, 10, 25, 12, 0, 0).unwrap();
        let w = FixtureWindow::weekend(sunday);
        assert_eq!(w.start, date(2026, 10, 25));
        assert_eq!(w.end, date(2026, 10, 26));
    }

    #[test]
    fn sunday_keyword() {
        let w = FixtureWindow::from_message("Sunday games?", monday()).unwrap();
        assert_eq!(w.start, date(2026, 10, 25));
    }

    #[test]
    fn month_day_literal_and_swapped_form() {
        let w = FixtureWindow::from_message("games on 10-31", monday()).unwrap();
        assert_eq!(w.start, date(2026, 10, 31));
        let w = FixtureWindow::from_message("games on 31-10", monday()).unwrap();
        assert_eq!(w.start, date(2026, 10, 31));
    }

    #[test]
    fn default_window_is_seven_days_from_now() {
        let now = monday();
        assert_eq!(FixtureWindow::from_message("Which match do you recommend?", now), None);
        let w = FixtureWindow::for_message("Which match do you recommend?", now, false);
        assert_eq!(w.start, now);
        assert_eq!(w.end, now + Duration::days(7));
        assert!(w.contains(now + Duration::days(3)));
        assert!(!w.contains(now + Duration::days(7)));
    }

    #[test]
    fn targeted_question_without_date_is_open_ended() {
        let now = monday();
        let w = FixtureWindow::for_message("When does Barcelona play?", now, true);
        assert_eq!(w.start, now);
        assert!(w.contains(now + Duration::days(10)));
        assert!(w.contains(now + Duration::days(200)));
        assert!(!w.contains(now - Duration::hours(1)));
    }

    #[test]
    fn named_date_wins_over_targeting() {
        let w = FixtureWindow::for_message("Does Barcelona play tomorrow?", monday(), true);
        assert_eq!(w, FixtureWindow::tomorrow(monday()));
    }
}
