use crate::data::persistence::get_data_dir;
use crate::data::{save_ceiling_record, CeilingRecord, CeilingRelease};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use super::chart::load_record_or_warn;

pub fn run_list(job_id: i64) -> Result<()> {
    let dir = get_data_dir()?;
    let record = load_record_or_warn(&dir, job_id);
    write_releases(job_id, &record, &mut std::io::stdout())
}

pub fn run_add(job_id: i64, date: NaiveDate, hours: f64, note: Option<&str>) -> Result<()> {
    if !hours.is_finite() {
        bail!("release hours must be a finite number");
    }
    let dir = get_data_dir()?;
    let mut record = load_record_or_warn(&dir, job_id);
    let id = record.add_release(CeilingRelease::new(date, hours, note));
    save_ceiling_record(&dir, job_id, &record)
        .with_context(|| format!("failed to save ceiling record for job {}", job_id))?;
    println!("Added release {} ({} hours on {}).", id, hours, date);
    Ok(())
}

pub fn run_remove(job_id: i64, release_id: &str) -> Result<()> {
    let dir = get_data_dir()?;
    let mut record = load_record_or_warn(&dir, job_id);
    if !record.remove_release(release_id) {
        bail!("no release '{}' on job {}", release_id, job_id);
    }
    save_ceiling_record(&dir, job_id, &record)
        .with_context(|| format!("failed to save ceiling record for job {}", job_id))?;
    println!("Removed release {}.", release_id);
    Ok(())
}

pub fn run_set_pop(job_id: i64, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        bail!("PoP start {} is after PoP end {}", start, end);
    }
    let dir = get_data_dir()?;
    let mut record = load_record_or_warn(&dir, job_id);
    record.pop_start = Some(start);
    record.pop_end = Some(end);
    save_ceiling_record(&dir, job_id, &record)
        .with_context(|| format!("failed to save ceiling record for job {}", job_id))?;
    println!("PoP for job {} set to [{} - {}].", job_id, start, end);
    Ok(())
}

pub(crate) fn write_releases<W: std::io::Write>(
    job_id: i64,
    record: &CeilingRecord,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Ceiling Releases for Job {}", job_id)?;
    match (record.pop_start, record.pop_end) {
        (Some(start), Some(end)) => writeln!(out, "PoP: [{} - {}]", start, end)?,
        _ => writeln!(out, "PoP: not set")?,
    }
    writeln!(out, "---")?;
    writeln!(
        out,
        "  {:<20} {:<12} {:>10}  {}",
        "Id", "Date", "Hours", "Note"
    )?;
    let mut total = 0.0;
    for release in &record.releases {
        total += release.hours;
        writeln!(
            out,
            "  {:<20} {:<12} {:>10.1}  {}",
            release.id,
            release.date.format("%Y-%m-%d"),
            release.hours,
            release.note.as_deref().unwrap_or("")
        )?;
    }
    writeln!(out, "---")?;
    writeln!(
        out,
        "Total: {} release(s), {:.1} ceiling hours",
        record.releases.len(),
        total
    )?;
    Ok(())
}
