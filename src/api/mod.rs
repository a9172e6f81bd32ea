pub mod file_source;

pub use file_source::FileSource;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A job code in the remote time-tracking system. `parent_id` of 0 or absent
/// marks a root; the full set forms a forest.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JobCode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl JobCode {
    pub fn is_root(&self) -> bool {
        matches!(self.parent_id, None | Some(0))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    /// Best-effort human-readable name for table output.
    pub fn resolved_name(&self) -> String {
        if let Some(name) = &self.display_name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            format!("User {}", self.id)
        } else {
            joined
        }
    }
}

/// One logged timesheet row. Fetched per query, never persisted here.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TimesheetEntry {
    pub id: i64,
    pub user_id: i64,
    pub jobcode_id: i64,
    pub duration_seconds: f64,
}

impl TimesheetEntry {
    pub fn duration_hours(&self) -> f64 {
        self.duration_seconds / 3600.0
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source is not configured: {0}")]
    Config(String),
    #[error("failed to read from timesheet source: {0}")]
    Transport(String),
    #[error("failed to decode timesheet payload: {0}")]
    Decode(String),
}

/// The three read operations consumed from the time-tracking backend. The
/// engine only ever sees this trait; the HTTP transport lives behind it.
pub trait TimesheetSource {
    fn fetch_job_codes(&self) -> Result<HashMap<i64, JobCode>, SourceError>;

    fn fetch_users(&self) -> Result<HashMap<i64, User>, SourceError>;

    /// Entries restricted to [start, end] inclusive and the given job codes.
    fn fetch_timesheets(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        jobcode_ids: &[i64],
    ) -> Result<Vec<TimesheetEntry>, SourceError>;
}

/// The ids of `root` and every job beneath it in the parent_id forest.
/// A chart for a job covers its whole subtree.
pub fn descendant_ids(jobs: &HashMap<i64, JobCode>, root: i64) -> Vec<i64> {
    let mut ids = vec![root];
    let mut i = 0;
    while i < ids.len() {
        let parent = ids[i];
        for job in jobs.values() {
            // the contains check keeps a malformed parent cycle finite
            if job.parent_id == Some(parent) && !ids.contains(&job.id) {
                ids.push(job.id);
            }
        }
        i += 1;
    }
    ids.sort_unstable();
    ids
}
