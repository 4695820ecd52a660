//! # Dates — Event Window Parsing and Lifecycle Instants
//!
//! Events carry their schedule as free text in Russian ("10 августа 2025",
//! "9 – 10 августа 2025", "30 июня - 2 июля 2025"). The format is fragile,
//! so parsing lives behind the [`EventWindowParser`] strategy trait and the
//! lifecycle logic only ever sees a resolved [`EventWindow`].
//!
//! The free text carries no clock time. The race-day start instant is fixed
//! at [`RACE_START_HOUR`] on the start date; registration closes one hour
//! before it.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};

/// First-race hour on the start date. Used to derive the registration
/// deadline (one hour earlier) since the date text has no time component.
pub const RACE_START_HOUR: u32 = 10;

/// A resolved event schedule: first and last race day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EventWindow {
    /// Race-day start instant: [`RACE_START_HOUR`] on the start date.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start
            .and_hms_opt(RACE_START_HOUR, 0, 0)
            .expect("valid fixed hour")
    }

    /// Registration closes one hour before the first race.
    pub fn registration_closes_at(&self) -> NaiveDateTime {
        self.starts_at() - TimeDelta::hours(1)
    }

    /// Absent participants are marked from midnight of the day after the
    /// start date.
    pub fn no_show_cutoff(&self) -> NaiveDateTime {
        (self.start + TimeDelta::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("valid midnight")
    }

    /// Results open at midnight of the end date.
    pub fn results_at(&self) -> NaiveDateTime {
        self.end.and_hms_opt(0, 0, 0).expect("valid midnight")
    }

    /// The event finishes one calendar month after results open.
    pub fn finished_at(&self) -> NaiveDateTime {
        self.results_at()
            .checked_add_months(Months::new(1))
            .expect("date within chrono range")
    }
}

/// Replaceable date-text parsing strategy. The lifecycle scheduler depends on
/// this trait, never on the string layout itself.
pub trait EventWindowParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<EventWindow>;
}

/// Default strategy: Russian month names, single dates and dash-separated
/// ranges, including cross-month and cross-year ranges.
#[derive(Debug, Default, Clone, Copy)]
pub struct RussianDateParser;

impl EventWindowParser for RussianDateParser {
    fn parse(&self, text: &str) -> Result<EventWindow> {
        let normalized = text.trim().replace(['–', '—'], "-");
        let parts: Vec<&str> = normalized.split('-').map(str::trim).collect();
        match parts.as_slice() {
            [single] => {
                let date = parse_date(single)
                    .with_context(|| format!("unparseable event date {:?}", text))?;
                Ok(EventWindow { start: date, end: date })
            }
            [left, right] => {
                let end = parse_date(right)
                    .with_context(|| format!("unparseable event date {:?}", text))?;
                let start = parse_partial_date(left, end)
                    .with_context(|| format!("unparseable event date {:?}", text))?;
                if start > end {
                    bail!("event date range {:?} ends before it starts", text);
                }
                Ok(EventWindow { start, end })
            }
            _ => bail!("unparseable event date {:?}", text),
        }
    }
}

/// Map a Russian month name (genitive or nominative, any case) to its number.
fn month_number(word: &str) -> Option<u32> {
    let w = word.to_lowercase();
    // Three-letter stems are unambiguous; May needs both inflections spelled
    // out so "мая"/"май" never collide with "мар..." (March).
    const STEMS: [(&str, u32); 13] = [
        ("янв", 1),
        ("фев", 2),
        ("мар", 3),
        ("апр", 4),
        ("мая", 5),
        ("май", 5),
        ("июн", 6),
        ("июл", 7),
        ("авг", 8),
        ("сен", 9),
        ("окт", 10),
        ("ноя", 11),
        ("дек", 12),
    ];
    STEMS
        .iter()
        .find(|(stem, _)| w.starts_with(stem))
        .map(|&(_, n)| n)
}

/// Parse a full "day month year" segment.
fn parse_date(segment: &str) -> Result<NaiveDate> {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    let [day, month, year] = tokens.as_slice() else {
        bail!("expected \"day month year\", got {:?}", segment);
    };
    let day: u32 = day.parse().with_context(|| format!("bad day {:?}", day))?;
    let month = month_number(month).ok_or_else(|| anyhow!("unknown month {:?}", month))?;
    let year: i32 = year.parse().with_context(|| format!("bad year {:?}", year))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("no such date {}-{}-{}", year, month, day))
}

/// Parse the left side of a range, borrowing month/year from the right side
/// when omitted ("9" in "9 - 10 августа 2025").
fn parse_partial_date(segment: &str, reference: NaiveDate) -> Result<NaiveDate> {
    use chrono::Datelike;
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    match tokens.as_slice() {
        [day] => {
            let day: u32 = day.parse().with_context(|| format!("bad day {:?}", day))?;
            NaiveDate::from_ymd_opt(reference.year(), reference.month(), day)
                .ok_or_else(|| anyhow!("no such day {} in reference month", day))
        }
        [day, month] => {
            let day: u32 = day.parse().with_context(|| format!("bad day {:?}", day))?;
            let month =
                month_number(month).ok_or_else(|| anyhow!("unknown month {:?}", month))?;
            NaiveDate::from_ymd_opt(reference.year(), month, day)
                .ok_or_else(|| anyhow!("no such date {}-{}", month, day))
        }
        [_, _, _] => parse_date(segment),
        _ => bail!("expected partial date, got {:?}", segment),
    }
}

// ── Tests ───────────────────────────────────────────────────────
