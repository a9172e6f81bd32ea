use crate::api::{FileSource, JobCode, TimesheetSource};
use crate::data::persistence::get_data_dir;
use anyhow::Result;
use std::collections::HashMap;

pub fn run() -> Result<()> {
    let dir = get_data_dir()?;
    let source = FileSource::new(&dir);
    let jobs = source.fetch_job_codes()?;
    write_jobs(&jobs, &mut std::io::stdout())
}

pub(crate) fn write_jobs<W: std::io::Write>(
    jobs: &HashMap<i64, JobCode>,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Job Codes")?;
    writeln!(out, "---")?;
    let mut roots: Vec<&JobCode> = jobs.values().filter(|j| j.is_root()).collect();
    roots.sort_by_key(|j| j.id);
    for root in roots {
        write_subtree(jobs, root, 0, out)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} job code(s)", jobs.len())?;
    Ok(())
}

fn write_subtree<W: std::io::Write>(
    jobs: &HashMap<i64, JobCode>,
    job: &JobCode,
    depth: usize,
    out: &mut W,
) -> Result<()> {
    let marker = if job.active == Some(false) { " (inactive)" } else { "" };
    writeln!(
        out,
        "  {:<8} {}{}{}",
        job.id,
        "  ".repeat(depth),
        job.name,
        marker
    )?;
    let mut children: Vec<&JobCode> = jobs
        .values()
        .filter(|j| j.parent_id == Some(job.id) && j.id != job.id)
        .collect();
    children.sort_by_key(|j| j.id);
    for child in children {
        write_subtree(jobs, child, depth + 1, out)?;
    }
    Ok(())
}
