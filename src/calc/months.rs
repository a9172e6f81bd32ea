use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A calendar month used as the axis of every chart series. Ordered
/// chronologically; rendered as `YYYY-MM` only at the display boundary so no
/// code compares zero-padded strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        MonthKey { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            MonthKey::new(self.year + 1, 1)
        } else {
            MonthKey::new(self.year, self.month + 1)
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // month is always 1..=12 for keys built via new/from_date
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| panic!("invalid month key {}-{}", self.year, self.month))
    }

    pub fn last_day(self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(self.first_day())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The inclusive sequence of months spanning the dates of `start` and `end`,
/// ascending. Empty when start's month is after end's month.
pub fn month_keys(start: NaiveDate, end: NaiveDate) -> Vec<MonthKey> {
    let first = MonthKey::from_date(start);
    let last = MonthKey::from_date(end);
    let mut keys = Vec::new();
    let mut current = first;
    while current <= last {
        keys.push(current);
        current = current.next();
    }
    keys
}
