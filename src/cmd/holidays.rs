use crate::calc::named_holidays;
use anyhow::Result;
use chrono::{Datelike, NaiveDate};

pub fn run(year: i32) -> Result<()> {
    write_holidays(year, &mut std::io::stdout())
}

pub(crate) fn write_holidays<W: std::io::Write>(year: i32, out: &mut W) -> Result<()> {
    let holidays = named_holidays(year);
    writeln!(out, "Observed Federal Holidays {}", year)?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<14} {:<11} {}", "Date", "Weekday", "Name")?;
    for (date, name) in &holidays {
        writeln!(
            out,
            "  {:<14} {:<11} {}{}",
            date.format("%Y-%m-%d"),
            date.weekday(),
            name,
            shifted_marker(*date)
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} holiday(s)", holidays.len())?;
    Ok(())
}

/// Marks fixed holidays that were shifted off a weekend.
fn shifted_marker(observed: NaiveDate) -> &'static str {
    let fixed = [(1, 1), (6, 19), (7, 4), (11, 11), (12, 25)];
    let is_fixed_date = fixed.contains(&(observed.month(), observed.day()));
    let neighbors_fixed = [
        observed.succ_opt().map(|d| (d.month(), d.day())),
        observed.pred_opt().map(|d| (d.month(), d.day())),
    ]
    .into_iter()
    .flatten()
    .any(|md| fixed.contains(&md));
    if !is_fixed_date && neighbors_fixed {
        " (observed)"
    } else {
        ""
    }
}
