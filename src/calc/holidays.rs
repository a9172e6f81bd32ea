use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{HashMap, HashSet};

/// The observed U.S. federal holidays for a year, sorted by date.
///
/// Fixed-date holidays that land on a weekend shift to the nearest weekday:
/// Saturday observes on the preceding Friday, Sunday on the following Monday.
/// Floating holidays are defined by weekday-ordinal rules and always land on
/// their weekday.
pub fn named_holidays(year: i32) -> Vec<(NaiveDate, &'static str)> {
    let mut days = vec![
        // Fixed holidays, weekend-shifted.
        (observed(year, 1, 1), "New Year's Day"),
        (observed(year, 6, 19), "Juneteenth"),
        (observed(year, 7, 4), "Independence Day"),
        (observed(year, 11, 11), "Veterans Day"),
        (observed(year, 12, 25), "Christmas Day"),
        // Floating holidays.
        (nth_weekday(year, 1, Weekday::Mon, 3), "Martin Luther King Jr. Day"),
        (nth_weekday(year, 2, Weekday::Mon, 3), "Presidents Day"),
        (last_weekday(year, 5, Weekday::Mon), "Memorial Day"),
        (nth_weekday(year, 9, Weekday::Mon, 1), "Labor Day"),
        (nth_weekday(year, 10, Weekday::Mon, 2), "Columbus Day"),
        (nth_weekday(year, 11, Weekday::Thu, 4), "Thanksgiving"),
    ];
    days.sort_by_key(|(date, _)| *date);
    days
}

/// The observed federal holiday dates for a year.
pub fn federal_holidays(year: i32) -> HashSet<NaiveDate> {
    named_holidays(year).into_iter().map(|(date, _)| date).collect()
}

/// Shifts a fixed-date holiday to its observed weekday.
fn observed(year: i32, month: u32, day: u32) -> NaiveDate {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid fixed holiday {}-{}-{}", year, month, day));
    match date.weekday() {
        Weekday::Sat => date.pred_opt().unwrap_or(date),
        Weekday::Sun => date.succ_opt().unwrap_or(date),
        _ => date,
    }
}

/// The nth occurrence of `weekday` in the given month (1-based).
fn nth_weekday(year: i32, month: u32, weekday: Weekday, nth: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| panic!("invalid month {}-{}", year, month));
    let offset = (7 + weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        % 7;
    first + chrono::Duration::days(offset + 7 * (nth as i64 - 1))
}

/// The last occurrence of `weekday` in the given month.
fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let fifth = nth_weekday(year, month, weekday, 5);
    if fifth.month() == month {
        fifth
    } else {
        fifth - chrono::Duration::days(7)
    }
}

/// Holiday lookups with a per-year memo so a multi-month scan computes each
/// year's holiday set once. Owned by the caller rather than process-global so
/// results stay deterministic in isolation.
#[derive(Debug, Default)]
pub struct HolidayCalendar {
    by_year: HashMap<i32, HashSet<NaiveDate>>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_holiday(&mut self, date: NaiveDate) -> bool {
        self.by_year
            .entry(date.year())
            .or_insert_with(|| federal_holidays(date.year()))
            .contains(&date)
    }

    /// Counts Mon-Fri, non-holiday days in [start, end] inclusive.
    /// Returns 0 when start > end.
    pub fn working_days(&mut self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start > end {
            return 0;
        }
        let mut count = 0;
        let mut current = start;
        while current <= end {
            let is_weekend = matches!(current.weekday(), Weekday::Sat | Weekday::Sun);
            if !is_weekend && !self.is_holiday(current) {
                count += 1;
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        count
    }
}
