use crate::api::{JobCode, SourceError, TimesheetEntry, TimesheetSource, User};
use crate::data::persistence::Persistable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A `TimesheetSource` backed by JSON files in the data directory. The HTTP
/// transport to the real time-tracking backend lives behind the same trait;
/// this implementation serves offline use and the sample data written by
/// `init`.
pub struct FileSource {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct JobCodeFile {
    pub jobcodes: Vec<JobCode>,
}

impl Persistable for JobCodeFile {
    fn filename() -> &'static str {
        "jobcodes.json"
    }
    fn is_json() -> bool {
        true
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct UserFile {
    pub users: Vec<User>,
}

impl Persistable for UserFile {
    fn filename() -> &'static str {
        "users.json"
    }
    fn is_json() -> bool {
        true
    }
}

/// On-disk timesheet rows carry the work date so the file source can apply
/// the same range filter the backend applies server-side. The date is
/// stripped before rows cross the trait boundary.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TimesheetRow {
    pub id: i64,
    pub user_id: i64,
    pub jobcode_id: i64,
    pub date: NaiveDate,
    pub duration_seconds: f64,
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct TimesheetFile {
    pub timesheets: Vec<TimesheetRow>,
}

impl Persistable for TimesheetFile {
    fn filename() -> &'static str {
        "timesheets.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl FileSource {
    pub fn new(dir: &Path) -> Self {
        FileSource {
            dir: dir.to_path_buf(),
        }
    }

    fn load<T: Persistable>(&self) -> Result<T, SourceError> {
        T::load_from(&self.dir).map_err(|e| SourceError::Decode(format!("{:#}", e)))
    }
}

impl TimesheetSource for FileSource {
    fn fetch_job_codes(&self) -> Result<HashMap<i64, JobCode>, SourceError> {
        // Job codes are the one file that must exist; without them there is
        // nothing to chart and the source counts as unconfigured.
        if !self.dir.join(JobCodeFile::filename()).exists() {
            return Err(SourceError::Config(format!(
                "no {} in {} (run `burnup init`?)",
                JobCodeFile::filename(),
                self.dir.display()
            )));
        }
        let file: JobCodeFile = self.load()?;
        Ok(file.jobcodes.into_iter().map(|j| (j.id, j)).collect())
    }

    fn fetch_users(&self) -> Result<HashMap<i64, User>, SourceError> {
        let file: UserFile = self.load()?;
        Ok(file.users.into_iter().map(|u| (u.id, u)).collect())
    }

    fn fetch_timesheets(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        jobcode_ids: &[i64],
    ) -> Result<Vec<TimesheetEntry>, SourceError> {
        let file: TimesheetFile = self.load()?;
        Ok(file
            .timesheets
            .into_iter()
            .filter(|row| row.date >= start && row.date <= end && jobcode_ids.contains(&row.jobcode_id))
            .map(|row| TimesheetEntry {
                id: row.id,
                user_id: row.user_id,
                jobcode_id: row.jobcode_id,
                duration_seconds: row.duration_seconds,
            })
            .collect())
    }
}
