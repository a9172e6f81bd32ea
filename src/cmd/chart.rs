use crate::api::FileSource;
use crate::calc::{generate_chart, ChartData, ChartError, ChartParams};
use crate::data::persistence::get_data_dir;
use crate::data::{load_ceiling_record, AppSettings, CeilingRecord};
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;

/// CLI date overrides; anything left unset falls back to the job's ceiling
/// record (PoP bounds) or today (query stop).
#[derive(Debug, Default, Clone, Copy)]
pub struct PopOverrides {
    pub pop_start: Option<NaiveDate>,
    pub pop_end: Option<NaiveDate>,
    pub query_stop: Option<NaiveDate>,
}

pub fn run(job_id: i64, overrides: PopOverrides) -> Result<()> {
    let dir = get_data_dir()?;
    let settings = AppSettings::load()?;
    let record = load_record_or_warn(&dir, job_id);
    let today = Local::now().date_naive();
    let params = resolve_params(&record, overrides, today)?;

    let source = FileSource::new(&dir);
    let chart = generate_chart(&source, job_id, &params, &record)
        .with_context(|| format!("failed to generate chart for job {}", job_id))?;

    write_chart(&settings, job_id, &params, &chart, &mut std::io::stdout())
}

/// A broken ceiling record should not block the chart: surface the message
/// and continue with an empty record.
pub(crate) fn load_record_or_warn(dir: &Path, job_id: i64) -> CeilingRecord {
    match load_ceiling_record(dir, job_id) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("warning: {}", ChartError::Persistence(format!("{:#}", e)));
            CeilingRecord::default()
        }
    }
}

pub(crate) fn resolve_params(
    record: &CeilingRecord,
    overrides: PopOverrides,
    today: NaiveDate,
) -> Result<ChartParams> {
    let pop_start = match overrides.pop_start.or(record.pop_start) {
        Some(date) => date,
        None => bail!("no PoP start: set one with `set-pop` or pass --pop-start"),
    };
    let pop_end = match overrides.pop_end.or(record.pop_end) {
        Some(date) => date,
        None => bail!("no PoP end: set one with `set-pop` or pass --pop-end"),
    };
    // Default query stop is today, never earlier than the PoP start so a
    // not-yet-started job still charts cleanly.
    let query_stop = overrides.query_stop.unwrap_or_else(|| today.max(pop_start));
    Ok(ChartParams {
        pop_start,
        pop_end,
        query_stop,
        today,
    })
}

pub(crate) fn write_chart<W: std::io::Write>(
    settings: &AppSettings,
    job_id: i64,
    params: &ChartParams,
    chart: &ChartData,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{}: Labor Burn for Job {}", settings.company, job_id)?;
    writeln!(
        out,
        "PoP: [{} - {}]   Actuals through: {}",
        params.pop_start.format("%Y-%m-%d"),
        params.pop_end.format("%Y-%m-%d"),
        params.query_stop.format("%Y-%m-%d")
    )?;
    writeln!(out, "---")?;
    writeln!(
        out,
        "  {:<9} {:>10} {:>12} {:>12} {:>10} {:>10}",
        "Month", "Hours", "Cumulative", "Actual", "Ceiling", "75%"
    )?;
    for (i, month) in chart.months.iter().enumerate() {
        let projected = chart
            .projected_start_index
            .is_some_and(|start| i >= start);
        let ceiling = match &chart.ceiling_series {
            Some(series) => format!("{:>10.1}", series[i]),
            None => format!("{:>10}", "-"),
        };
        let threshold = match &chart.ceiling75_series {
            Some(series) => format!("{:>10.1}", series[i]),
            None => format!("{:>10}", "-"),
        };
        writeln!(
            out,
            "{} {:<9} {:>10.1} {:>12.1} {:>12.1} {} {}",
            if projected { "*" } else { " " },
            month.to_string(),
            chart.monthly_series[i],
            chart.cumulative_series[i],
            chart.cumulative_actual_series[i],
            ceiling,
            threshold
        )?;
    }
    writeln!(out, "---")?;
    if chart.projected_start_index.is_some() {
        writeln!(out, "* projected (working days x 8)")?;
    }
    if let (Some(total), Some(ceiling)) = (
        chart.cumulative_series.last(),
        chart.ceiling_series.as_ref().and_then(|s| s.last()),
    ) {
        let pct = if *ceiling != 0.0 {
            100.0 * total / ceiling
        } else {
            0.0
        };
        writeln!(
            out,
            "Projected total: {:.1} of {:.1} ceiling hours ({:.1}%)",
            total, ceiling, pct
        )?;
    }
    if chart.employee_names.is_empty() {
        writeln!(out, "No time logged in the fetched range.")?;
    } else {
        writeln!(out, "Employees: {}", chart.employee_names.join(", "))?;
    }
    Ok(())
}
