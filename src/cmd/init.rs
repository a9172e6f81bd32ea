use crate::api::file_source::{JobCodeFile, TimesheetFile, TimesheetRow, UserFile};
use crate::api::{JobCode, User};
use crate::data::persistence::get_data_dir;
use crate::data::{save_ceiling_record, AppSettings, CeilingRecord, CeilingRelease, Persistable};
use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

/// Id of the job the starter data charts out of the box.
pub const SAMPLE_JOB_ID: i64 = 1001;

pub fn run() -> Result<()> {
    let dir = get_data_dir()?;
    fs::create_dir_all(&dir)?;
    run_in_dir(&dir)?;
    println!("Data files initialized successfully.");
    println!("Try: burnup chart {}", SAMPLE_JOB_ID);
    Ok(())
}

/// Writes all starter data files into `dir`. Exposed for unit testing.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    AppSettings::default().save_to(dir)?;
    write_jobcodes(dir)?;
    write_users(dir)?;
    write_timesheets(dir)?;
    write_ceiling(dir)?;
    Ok(())
}

fn write_jobcodes(dir: &Path) -> Result<()> {
    let file = JobCodeFile {
        jobcodes: vec![
            job(SAMPLE_JOB_ID, "Orion Contract", None),
            job(1002, "Engineering", Some(SAMPLE_JOB_ID)),
            job(1003, "Test & Evaluation", Some(SAMPLE_JOB_ID)),
        ],
    };
    file.save_to(dir)
}

fn write_users(dir: &Path) -> Result<()> {
    let file = UserFile {
        users: vec![
            user(1, "Dana", "Scully"),
            user(2, "Fox", "Mulder"),
        ],
    };
    file.save_to(dir)
}

fn write_timesheets(dir: &Path) -> Result<()> {
    // One work week of starter entries against the sample job's children.
    let mut rows = Vec::new();
    for day in 6..=10 {
        rows.push(row(rows.len() as i64 + 1, 1, 1002, d(2025, 1, day), 8.0));
        rows.push(row(rows.len() as i64 + 1, 2, 1003, d(2025, 1, day), 6.5));
    }
    TimesheetFile { timesheets: rows }.save_to(dir)
}

fn write_ceiling(dir: &Path) -> Result<()> {
    let mut record = CeilingRecord {
        pop_start: Some(d(2025, 1, 1)),
        pop_end: Some(d(2025, 9, 30)),
        releases: vec![],
    };
    record.add_release(CeilingRelease::new(d(2025, 1, 1), 2000.0, Some("base award")));
    record.add_release(CeilingRelease::new(d(2025, 4, 1), 500.0, Some("option 1")));
    save_ceiling_record(dir, SAMPLE_JOB_ID, &record)
}

fn job(id: i64, name: &str, parent_id: Option<i64>) -> JobCode {
    JobCode {
        id,
        name: name.to_string(),
        parent_id,
        active: Some(true),
    }
}

fn user(id: i64, first: &str, last: &str) -> User {
    User {
        id,
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        display_name: None,
    }
}

fn row(id: i64, user_id: i64, jobcode_id: i64, date: NaiveDate, hours: f64) -> TimesheetRow {
    TimesheetRow {
        id,
        user_id,
        jobcode_id,
        date,
        duration_seconds: hours * 3600.0,
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}
