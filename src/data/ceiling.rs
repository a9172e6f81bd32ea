use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One dated, signed adjustment to the contractual ceiling. Hours may be
/// negative (a reduction) or fractional; a release has no effect before its
/// date, and releases sharing a date accrue together.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CeilingRelease {
    pub id: String,
    pub date: NaiveDate,
    pub hours: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl CeilingRelease {
    pub fn new(date: NaiveDate, hours: f64, note: Option<&str>) -> Self {
        // Derived id keeps releases addressable for remove without an
        // external id generator; collisions on identical (date, hours) pairs
        // are disambiguated by the counter suffix at insert time.
        CeilingRelease {
            id: format!("{}-{}", date.format("%Y%m%d"), hours),
            date,
            hours,
            note: note.map(str::to_string),
        }
    }
}

/// The per-job ceiling configuration: optional PoP bounds plus the release
/// list, kept sorted ascending by date. The chart engine treats a record as
/// an immutable snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CeilingRecord {
    #[serde(default)]
    pub pop_start: Option<NaiveDate>,
    #[serde(default)]
    pub pop_end: Option<NaiveDate>,
    #[serde(default)]
    pub releases: Vec<CeilingRelease>,
}

/// On-disk shape. Early versions of the tool wrote a bare array of releases
/// with no PoP dates; those files still load as a record with both bounds
/// absent.
#[derive(Deserialize)]
#[serde(untagged)]
enum CeilingRecordFile {
    Record(CeilingRecord),
    Legacy(Vec<CeilingRelease>),
}

impl From<CeilingRecordFile> for CeilingRecord {
    fn from(file: CeilingRecordFile) -> Self {
        match file {
            CeilingRecordFile::Record(record) => record,
            CeilingRecordFile::Legacy(releases) => CeilingRecord {
                pop_start: None,
                pop_end: None,
                releases,
            },
        }
    }
}

impl CeilingRecord {
    /// Inserts a release, disambiguating its id if taken. Returns the final
    /// id.
    pub fn add_release(&mut self, mut release: CeilingRelease) -> String {
        let mut suffix = 1;
        let base = release.id.clone();
        while self.releases.iter().any(|r| r.id == release.id) {
            suffix += 1;
            release.id = format!("{}-{}", base, suffix);
        }
        let id = release.id.clone();
        self.releases.push(release);
        self.sort_releases();
        id
    }

    /// Removes the release with the given id. Returns false when absent.
    pub fn remove_release(&mut self, id: &str) -> bool {
        let before = self.releases.len();
        self.releases.retain(|r| r.id != id);
        self.releases.len() != before
    }

    pub fn sort_releases(&mut self) {
        self.releases.sort_by_key(|r| r.date);
    }

    /// True when there is nothing to accrue.
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

fn record_filename(job_id: i64) -> String {
    format!("ceiling_{}.json", job_id)
}

/// Loads the ceiling record for a job. A missing file is an empty record,
/// not an error; a malformed file is an error the caller may downgrade to a
/// warning plus an empty record.
pub fn load_ceiling_record(dir: &Path, job_id: i64) -> Result<CeilingRecord> {
    let path = dir.join(record_filename(job_id));
    if !path.exists() {
        return Ok(CeilingRecord::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: CeilingRecordFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse ceiling record {}", path.display()))?;
    let mut record = CeilingRecord::from(file);
    record.sort_releases();
    Ok(record)
}

/// Persists the record with releases sorted ascending by date.
pub fn save_ceiling_record(dir: &Path, job_id: i64, record: &CeilingRecord) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create dir {}", dir.display()))?;
    let mut sorted = record.clone();
    sorted.sort_releases();
    let path = dir.join(record_filename(job_id));
    let json = serde_json::to_string_pretty(&sorted).context("failed to serialize ceiling record")?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
