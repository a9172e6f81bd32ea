use crate::api::{descendant_ids, SourceError, TimesheetEntry, TimesheetSource};
use crate::calc::ceiling::accrue_ceiling;
use crate::calc::holidays::HolidayCalendar;
use crate::calc::months::{month_keys, MonthKey};
use crate::data::CeilingRecord;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Projected months bill a fixed 8-hour day per working day.
pub const HOURS_PER_DAY: f64 = 8.0;

#[derive(Debug, Error)]
pub enum ChartError {
    /// Missing or malformed source configuration. Fatal to the session, no
    /// retry.
    #[error("configuration error: {0}")]
    Config(String),
    /// User-correctable input problem, caught before any fetch is issued.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Any per-month fetch failing aborts the whole generation; a partial
    /// cumulative series would be silently misleading.
    #[error("timesheet source: {0}")]
    Source(SourceError),
    /// Ceiling record I/O. Callers surface the message and may proceed with
    /// an empty record.
    #[error("ceiling record: {0}")]
    Persistence(String),
}

impl From<SourceError> for ChartError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Config(msg) => ChartError::Config(msg),
            other => ChartError::Source(other),
        }
    }
}

/// Inputs of one chart generation. `today` is injected rather than read from
/// the system clock so the projection boundary is deterministic under test.
#[derive(Debug, Clone, Copy)]
pub struct ChartParams {
    pub pop_start: NaiveDate,
    pub pop_end: NaiveDate,
    /// Actuals are fetched through this date; later days are projected.
    pub query_stop: NaiveDate,
    pub today: NaiveDate,
}

impl ChartParams {
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.pop_start > self.pop_end {
            return Err(ChartError::Validation(format!(
                "PoP start {} is after PoP end {}",
                self.pop_start, self.pop_end
            )));
        }
        if self.query_stop < self.pop_start {
            return Err(ChartError::Validation(format!(
                "query stop {} is before PoP start {}",
                self.query_stop, self.pop_start
            )));
        }
        Ok(())
    }
}

/// The complete month-indexed output of one generation. All series are
/// aligned index-for-index with `months`.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub months: Vec<MonthKey>,
    /// Per-month hours: actuals for fetched months, working-days x 8 beyond
    /// the query stop.
    pub monthly_series: Vec<f64>,
    pub cumulative_series: Vec<f64>,
    /// Running total of actual hours only; flat across projected months.
    pub cumulative_actual_series: Vec<f64>,
    pub ceiling_series: Option<Vec<f64>>,
    pub ceiling75_series: Option<Vec<f64>>,
    /// Index of the first projected month; None when the PoP does not extend
    /// past the query stop.
    pub projected_start_index: Option<usize>,
    /// Distinct users who logged time, resolved to display names, sorted.
    pub employee_names: Vec<String>,
}

/// One clamped fetch range per calendar month intersecting
/// [pop_start, query_stop]. Ranges are disjoint, so folding batches by month
/// can never double-count an entry.
pub fn fetch_ranges(pop_start: NaiveDate, query_stop: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    if query_stop < pop_start {
        return Vec::new();
    }
    month_keys(pop_start, query_stop)
        .into_iter()
        .map(|m| (m.first_day().max(pop_start), m.last_day().min(query_stop)))
        .collect()
}

/// Folds per-month timesheet batches into month buckets and the set of users
/// observed.
#[derive(Debug, Default)]
pub struct ActualsAccumulator {
    pub hours_by_month: HashMap<MonthKey, f64>,
    pub user_ids: HashSet<i64>,
}

impl ActualsAccumulator {
    pub fn fold(&mut self, month: MonthKey, entries: &[TimesheetEntry]) {
        for entry in entries {
            *self.hours_by_month.entry(month).or_insert(0.0) += entry.duration_hours();
            self.user_ids.insert(entry.user_id);
        }
    }
}

/// Adds working-days x 8 to each month bucket for the portion of the month
/// inside (query_stop, pop_end]. Additive on top of any actual hours already
/// present, never a replacement.
pub fn extend_projection(
    hours: &mut HashMap<MonthKey, f64>,
    params: &ChartParams,
    calendar: &mut HolidayCalendar,
) {
    if params.pop_end <= params.query_stop {
        return;
    }
    let proj_start = match params.query_stop.succ_opt() {
        Some(d) => d,
        None => return,
    };
    for month in month_keys(proj_start, params.pop_end) {
        let lo = month.first_day().max(proj_start);
        let hi = month.last_day().min(params.pop_end);
        if lo <= hi {
            let days = calendar.working_days(lo, hi) as f64;
            *hours.entry(month).or_insert(0.0) += days * HOURS_PER_DAY;
        }
    }
}

/// The index of the first month considered projected.
///
/// Boundary month is the month containing the day after the query stop. When
/// the query stop is in the future relative to `today`, a month is projected
/// once its key reaches the boundary; when the query stop is today or past,
/// only months strictly after the boundary count. The asymmetry replicates
/// long-observed behavior and is pinned by regression tests rather than
/// smoothed over.
pub fn projected_start_index(months: &[MonthKey], params: &ChartParams) -> Option<usize> {
    if params.pop_end <= params.query_stop {
        return None;
    }
    let boundary = MonthKey::from_date(params.query_stop.succ_opt()?);
    if params.query_stop > params.today {
        months.iter().position(|m| *m >= boundary)
    } else {
        months.iter().position(|m| *m > boundary)
    }
}

/// Generates the full burn chart for one job: month-by-month actuals through
/// the query stop, projected working-day hours through PoP end, and the
/// stepped ceiling accrued from the job's release record.
///
/// The source is consulted sequentially, one fetch per calendar month; any
/// failure discards all partial state and surfaces as `ChartError::Source`.
pub fn generate_chart(
    source: &dyn TimesheetSource,
    job_id: i64,
    params: &ChartParams,
    record: &CeilingRecord,
) -> Result<ChartData, ChartError> {
    params.validate()?;

    let jobs = source.fetch_job_codes()?;
    if !jobs.contains_key(&job_id) {
        return Err(ChartError::Validation(format!("unknown job code {}", job_id)));
    }
    let job_ids = descendant_ids(&jobs, job_id);
    let users = source.fetch_users()?;

    let mut acc = ActualsAccumulator::default();
    for (start, end) in fetch_ranges(params.pop_start, params.query_stop) {
        let entries = source.fetch_timesheets(start, end, &job_ids)?;
        acc.fold(MonthKey::from_date(start), &entries);
    }

    let actual_hours = acc.hours_by_month.clone();
    let mut hours = acc.hours_by_month;
    let mut calendar = HolidayCalendar::new();
    extend_projection(&mut hours, params, &mut calendar);

    let axis_end = params.pop_end.max(params.query_stop);
    let months = month_keys(params.pop_start, axis_end);

    let mut monthly_series = Vec::with_capacity(months.len());
    let mut cumulative_series = Vec::with_capacity(months.len());
    let mut cumulative_actual_series = Vec::with_capacity(months.len());
    let mut running = 0.0;
    let mut running_actual = 0.0;
    for month in &months {
        let bucket = hours.get(month).copied().unwrap_or(0.0);
        running += bucket;
        running_actual += actual_hours.get(month).copied().unwrap_or(0.0);
        monthly_series.push(bucket);
        cumulative_series.push(running);
        cumulative_actual_series.push(running_actual);
    }

    let mut releases = record.releases.clone();
    releases.sort_by_key(|r| r.date);
    let (ceiling_series, ceiling75_series) = match accrue_ceiling(&releases, &months) {
        Some(series) => (Some(series.ceiling), Some(series.threshold75)),
        None => (None, None),
    };

    let mut employee_names: Vec<String> = acc
        .user_ids
        .iter()
        .map(|id| match users.get(id) {
            Some(user) => user.resolved_name(),
            None => format!("User {}", id),
        })
        .collect();
    employee_names.sort();

    Ok(ChartData {
        projected_start_index: projected_start_index(&months, params),
        months,
        monthly_series,
        cumulative_series,
        cumulative_actual_series,
        ceiling_series,
        ceiling75_series,
        employee_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{JobCode, User};
    use crate::data::CeilingRelease;
    use std::cell::RefCell;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// In-memory source: rows carry a date so range fetches can filter the
    /// way the real backend does server-side.
    #[derive(Default)]
    struct MockSource {
        jobs: HashMap<i64, JobCode>,
        users: HashMap<i64, User>,
        rows: Vec<(NaiveDate, TimesheetEntry)>,
        fetch_calls: RefCell<usize>,
        fail_after: Option<usize>,
    }

    impl MockSource {
        fn with_job(id: i64, parent_id: Option<i64>) -> Self {
            let mut source = MockSource::default();
            source.add_job(id, parent_id);
            source
        }

        fn add_job(&mut self, id: i64, parent_id: Option<i64>) {
            self.jobs.insert(
                id,
                JobCode {
                    id,
                    name: format!("Job {}", id),
                    parent_id,
                    active: Some(true),
                },
            );
        }

        fn add_user(&mut self, id: i64, display_name: &str) {
            self.users.insert(
                id,
                User {
                    id,
                    first_name: None,
                    last_name: None,
                    display_name: Some(display_name.to_string()),
                },
            );
        }

        fn add_row(&mut self, date: NaiveDate, user_id: i64, jobcode_id: i64, hours: f64) {
            let id = self.rows.len() as i64 + 1;
            self.rows.push((
                date,
                TimesheetEntry {
                    id,
                    user_id,
                    jobcode_id,
                    duration_seconds: hours * 3600.0,
                },
            ));
        }
    }

    impl TimesheetSource for MockSource {
        fn fetch_job_codes(&self) -> Result<HashMap<i64, JobCode>, SourceError> {
            Ok(self.jobs.clone())
        }

        fn fetch_users(&self) -> Result<HashMap<i64, User>, SourceError> {
            Ok(self.users.clone())
        }

        fn fetch_timesheets(
            &self,
            start: NaiveDate,
            end: NaiveDate,
            jobcode_ids: &[i64],
        ) -> Result<Vec<TimesheetEntry>, SourceError> {
            let mut calls = self.fetch_calls.borrow_mut();
            *calls += 1;
            if let Some(limit) = self.fail_after {
                if *calls > limit {
                    return Err(SourceError::Transport("connection reset".to_string()));
                }
            }
            Ok(self
                .rows
                .iter()
                .filter(|(date, entry)| {
                    *date >= start && *date <= end && jobcode_ids.contains(&entry.jobcode_id)
                })
                .map(|(_, entry)| entry.clone())
                .collect())
        }
    }

    fn params(pop_start: NaiveDate, pop_end: NaiveDate, query_stop: NaiveDate, today: NaiveDate) -> ChartParams {
        ChartParams {
            pop_start,
            pop_end,
            query_stop,
            today,
        }
    }

    #[test]
    fn test_fetch_ranges_clamped_to_pop_and_query_stop() {
        let ranges = fetch_ranges(d(2025, 1, 15), d(2025, 3, 10));
        assert_eq!(
            ranges,
            vec![
                (d(2025, 1, 15), d(2025, 1, 31)),
                (d(2025, 2, 1), d(2025, 2, 28)),
                (d(2025, 3, 1), d(2025, 3, 10)),
            ]
        );
    }

    #[test]
    fn test_fetch_ranges_empty_when_query_stop_precedes_start() {
        assert!(fetch_ranges(d(2025, 2, 1), d(2025, 1, 31)).is_empty());
    }

    #[test]
    fn test_accumulator_folds_hours_and_users() {
        let mut acc = ActualsAccumulator::default();
        let jan = MonthKey::new(2025, 1);
        let entries = vec![
            TimesheetEntry {
                id: 1,
                user_id: 10,
                jobcode_id: 1,
                duration_seconds: 7200.0,
            },
            TimesheetEntry {
                id: 2,
                user_id: 11,
                jobcode_id: 1,
                duration_seconds: 1800.0,
            },
        ];
        acc.fold(jan, &entries);
        acc.fold(MonthKey::new(2025, 2), &entries[..1]);
        assert!((acc.hours_by_month[&jan] - 2.5).abs() < 1e-9);
        assert_eq!(acc.user_ids.len(), 2);
    }

    #[test]
    fn test_projection_additivity() {
        // PoP 2025-01-01..2025-03-31, query stop Fri 2025-01-31, 160 actual
        // January hours. February has 19 working days (Presidents Day),
        // March has 21.
        let mut source = MockSource::with_job(1, None);
        source.add_user(10, "Dana Scully");
        for day in 1..=20 {
            source.add_row(d(2025, 1, day), 10, 1, 8.0);
        }
        let p = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 1, 15));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();

        assert_eq!(chart.months.len(), 3);
        assert_eq!(chart.monthly_series[0], 160.0);
        assert_eq!(chart.monthly_series[1], 19.0 * 8.0);
        assert_eq!(chart.monthly_series[2], 21.0 * 8.0);
        assert_eq!(
            chart.cumulative_series[2],
            160.0 + 19.0 * 8.0 + 21.0 * 8.0
        );
        assert_eq!(chart.projected_start_index, Some(1));
        assert_eq!(chart.employee_names, vec!["Dana Scully".to_string()]);
    }

    #[test]
    fn test_boundary_asymmetry_future_vs_past_query_stop() {
        let months = month_keys(d(2025, 1, 1), d(2025, 3, 31));
        // Query stop at month end; day after falls in February.
        let future = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 1, 15));
        assert_eq!(projected_start_index(&months, &future), Some(1));
        // Same query stop, but already in the past: only months strictly
        // after the boundary are marked.
        let past = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 3, 1));
        assert_eq!(projected_start_index(&months, &past), Some(2));
    }

    #[test]
    fn test_mid_month_query_stop_in_past_keeps_own_month_unmarked() {
        // Day after 2025-01-15 is still January, so a past query stop marks
        // February even though late January carries projected hours.
        let months = month_keys(d(2025, 1, 1), d(2025, 3, 31));
        let past = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 15), d(2025, 2, 10));
        assert_eq!(projected_start_index(&months, &past), Some(1));
        let future = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 15), d(2025, 1, 10));
        assert_eq!(projected_start_index(&months, &future), Some(0));
    }

    #[test]
    fn test_no_projection_when_pop_end_at_query_stop() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 10), 10, 1, 8.0);
        let p = params(d(2025, 1, 1), d(2025, 2, 28), d(2025, 2, 28), d(2025, 3, 15));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        assert_eq!(chart.projected_start_index, None);
        assert_eq!(chart.monthly_series[1], 0.0);
    }

    #[test]
    fn test_projection_is_additive_on_top_of_actuals() {
        // An actual logged after the query stop's month boundary case: the
        // projected contribution lands in the same bucket as fetched hours.
        let mut hours = HashMap::new();
        hours.insert(MonthKey::new(2025, 2), 4.0);
        let p = params(d(2025, 1, 1), d(2025, 2, 28), d(2025, 1, 31), d(2025, 1, 15));
        let mut calendar = HolidayCalendar::new();
        extend_projection(&mut hours, &p, &mut calendar);
        assert_eq!(hours[&MonthKey::new(2025, 2)], 4.0 + 19.0 * 8.0);
    }

    #[test]
    fn test_partial_final_month_projection() {
        // PoP ends mid-March: only working days through the 14th project.
        let mut hours = HashMap::new();
        let p = params(d(2025, 1, 1), d(2025, 3, 14), d(2025, 2, 28), d(2025, 1, 15));
        let mut calendar = HolidayCalendar::new();
        extend_projection(&mut hours, &p, &mut calendar);
        // Mar 3-7 and 10-14 are working days
        assert_eq!(hours[&MonthKey::new(2025, 3)], 10.0 * 8.0);
        assert_eq!(hours.len(), 1);
    }

    #[test]
    fn test_cumulative_series_monotonic() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 6), 10, 1, 3.5);
        source.add_row(d(2025, 2, 3), 10, 1, 6.0);
        let p = params(d(2025, 1, 1), d(2025, 6, 30), d(2025, 2, 28), d(2025, 3, 15));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        for pair in chart.cumulative_series.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_cumulative_actual_series_flat_after_query_stop() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 6), 10, 1, 40.0);
        let p = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 1, 15));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        assert_eq!(chart.cumulative_actual_series, vec![40.0, 40.0, 40.0]);
        assert!(chart.cumulative_series[2] > chart.cumulative_actual_series[2]);
    }

    #[test]
    fn test_child_job_hours_roll_up_to_parent() {
        let mut source = MockSource::with_job(1, None);
        source.add_job(2, Some(1));
        source.add_job(3, None); // unrelated root
        source.add_row(d(2025, 1, 6), 10, 2, 8.0);
        source.add_row(d(2025, 1, 6), 10, 3, 8.0);
        let p = params(d(2025, 1, 1), d(2025, 1, 31), d(2025, 1, 31), d(2025, 2, 15));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        assert_eq!(chart.monthly_series, vec![8.0]);
    }

    #[test]
    fn test_validation_rejects_reversed_pop_before_any_fetch() {
        let source = MockSource::with_job(1, None);
        let p = params(d(2025, 3, 1), d(2025, 1, 1), d(2025, 2, 1), d(2025, 2, 1));
        let err = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap_err();
        assert!(matches!(err, ChartError::Validation(_)));
        assert_eq!(*source.fetch_calls.borrow(), 0);
    }

    #[test]
    fn test_validation_rejects_query_stop_before_pop_start() {
        let source = MockSource::with_job(1, None);
        let p = params(d(2025, 2, 1), d(2025, 6, 30), d(2025, 1, 15), d(2025, 3, 1));
        let err = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap_err();
        assert!(matches!(err, ChartError::Validation(_)));
    }

    #[test]
    fn test_unknown_job_is_a_validation_error() {
        let source = MockSource::with_job(1, None);
        let p = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 2, 1));
        let err = generate_chart(&source, 99, &p, &CeilingRecord::default()).unwrap_err();
        assert!(matches!(err, ChartError::Validation(_)));
    }

    #[test]
    fn test_mid_sequence_fetch_failure_aborts_generation() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 6), 10, 1, 8.0);
        source.fail_after = Some(1);
        let p = params(d(2025, 1, 1), d(2025, 4, 30), d(2025, 3, 31), d(2025, 4, 15));
        let err = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap_err();
        assert!(matches!(err, ChartError::Source(_)));
    }

    #[test]
    fn test_source_config_error_maps_to_config_variant() {
        let err: ChartError = SourceError::Config("no data directory".to_string()).into();
        assert!(matches!(err, ChartError::Config(_)));
    }

    #[test]
    fn test_ceiling_series_from_record() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 6), 10, 1, 8.0);
        let record = CeilingRecord {
            pop_start: None,
            pop_end: None,
            releases: vec![
                CeilingRelease::new(d(2025, 1, 15), 100.0, None),
                CeilingRelease::new(d(2025, 2, 20), -20.0, None),
            ],
        };
        let p = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 2, 1));
        let chart = generate_chart(&source, 1, &p, &record).unwrap();
        assert_eq!(chart.ceiling_series, Some(vec![100.0, 80.0, 80.0]));
        assert_eq!(chart.ceiling75_series, Some(vec![75.0, 60.0, 60.0]));
    }

    #[test]
    fn test_empty_record_yields_absent_ceiling() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 6), 10, 1, 8.0);
        let p = params(d(2025, 1, 1), d(2025, 2, 28), d(2025, 1, 31), d(2025, 2, 1));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        assert!(chart.ceiling_series.is_none());
        assert!(chart.ceiling75_series.is_none());
    }

    #[test]
    fn test_unsorted_record_releases_accrue_correctly() {
        let mut source = MockSource::with_job(1, None);
        source.add_row(d(2025, 1, 6), 10, 1, 8.0);
        // Record assembled by hand, out of order; the engine sorts its own
        // snapshot before the single-pass accrual.
        let record = CeilingRecord {
            pop_start: None,
            pop_end: None,
            releases: vec![
                CeilingRelease::new(d(2025, 3, 1), 50.0, None),
                CeilingRelease::new(d(2025, 1, 1), 200.0, None),
            ],
        };
        let p = params(d(2025, 1, 1), d(2025, 3, 31), d(2025, 1, 31), d(2025, 2, 1));
        let chart = generate_chart(&source, 1, &p, &record).unwrap();
        assert_eq!(chart.ceiling_series, Some(vec![200.0, 200.0, 250.0]));
    }

    #[test]
    fn test_employee_names_resolved_and_sorted() {
        let mut source = MockSource::with_job(1, None);
        source.add_user(10, "Walter Skinner");
        source.add_user(11, "Dana Scully");
        source.add_row(d(2025, 1, 6), 10, 1, 8.0);
        source.add_row(d(2025, 1, 7), 11, 1, 8.0);
        source.add_row(d(2025, 1, 8), 12, 1, 8.0); // unknown user
        let p = params(d(2025, 1, 1), d(2025, 1, 31), d(2025, 1, 31), d(2025, 2, 1));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        assert_eq!(
            chart.employee_names,
            vec![
                "Dana Scully".to_string(),
                "User 12".to_string(),
                "Walter Skinner".to_string(),
            ]
        );
    }

    #[test]
    fn test_one_fetch_per_month() {
        let source = MockSource::with_job(1, None);
        let p = params(d(2025, 1, 10), d(2025, 8, 31), d(2025, 4, 20), d(2025, 5, 1));
        generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        // Jan through Apr intersect [pop_start, query_stop]
        assert_eq!(*source.fetch_calls.borrow(), 4);
    }

    #[test]
    fn test_axis_extends_to_query_stop_when_past_pop_end() {
        // Query stop after PoP end: axis still reaches the query stop month.
        let source = MockSource::with_job(1, None);
        let p = params(d(2025, 1, 1), d(2025, 2, 28), d(2025, 4, 15), d(2025, 5, 1));
        let chart = generate_chart(&source, 1, &p, &CeilingRecord::default()).unwrap();
        assert_eq!(chart.months.len(), 4);
        assert_eq!(chart.projected_start_index, None);
    }
}
