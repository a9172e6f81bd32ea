use crate::calc::months::MonthKey;
use crate::data::CeilingRelease;

/// The stepped ceiling aligned with a month axis, plus its 75% threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CeilingSeries {
    pub ceiling: Vec<f64>,
    pub threshold75: Vec<f64>,
}

/// Accrues dated releases onto the month axis: a month's value includes every
/// release dated strictly before the first day of the following month.
///
/// `releases` must be sorted ascending by date; a single forward cursor walks
/// the list once, so the merge is O(releases + months). Returns `None` when
/// every accrued value is exactly zero, which callers treat as "no ceiling
/// configured".
pub fn accrue_ceiling(releases: &[CeilingRelease], months: &[MonthKey]) -> Option<CeilingSeries> {
    let mut total = 0.0;
    let mut cursor = 0;
    let mut ceiling = Vec::with_capacity(months.len());
    for month in months {
        let next_month_start = month.next().first_day();
        while cursor < releases.len() && releases[cursor].date < next_month_start {
            total += releases[cursor].hours;
            cursor += 1;
        }
        ceiling.push(total);
    }
    if ceiling.iter().all(|v| *v == 0.0) {
        return None;
    }
    let threshold75 = ceiling.iter().map(|v| v * 0.75).collect();
    Some(CeilingSeries {
        ceiling,
        threshold75,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn release(y: i32, m: u32, day: u32, hours: f64) -> CeilingRelease {
        CeilingRelease::new(NaiveDate::from_ymd_opt(y, m, day).unwrap(), hours, None)
    }

    fn months(specs: &[(i32, u32)]) -> Vec<MonthKey> {
        specs.iter().map(|&(y, m)| MonthKey::new(y, m)).collect()
    }

    #[test]
    fn test_accrual_with_signed_releases() {
        let releases = vec![release(2025, 1, 15, 100.0), release(2025, 2, 20, -20.0)];
        let axis = months(&[(2025, 1), (2025, 2), (2025, 3)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![100.0, 80.0, 80.0]);
        assert_eq!(series.threshold75, vec![75.0, 60.0, 60.0]);
    }

    #[test]
    fn test_release_has_no_effect_before_its_month() {
        let releases = vec![release(2025, 3, 10, 40.0)];
        let axis = months(&[(2025, 1), (2025, 2), (2025, 3)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![0.0, 0.0, 40.0]);
    }

    #[test]
    fn test_release_before_axis_counts_from_first_month() {
        let releases = vec![release(2024, 6, 1, 300.0)];
        let axis = months(&[(2025, 1), (2025, 2)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![300.0, 300.0]);
    }

    #[test]
    fn test_releases_sharing_a_date_accrue_together() {
        let releases = vec![
            release(2025, 1, 15, 100.0),
            release(2025, 1, 15, 50.0),
        ];
        let axis = months(&[(2025, 1)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![150.0]);
    }

    #[test]
    fn test_last_day_of_month_included_in_that_month() {
        let releases = vec![release(2025, 1, 31, 10.0)];
        let axis = months(&[(2025, 1), (2025, 2)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![10.0, 10.0]);
    }

    #[test]
    fn test_empty_release_list_is_absent() {
        let axis = months(&[(2025, 1), (2025, 2)]);
        assert!(accrue_ceiling(&[], &axis).is_none());
    }

    #[test]
    fn test_all_zero_accrual_is_absent() {
        // +100 and -100 land in the same month, so every value is zero
        let releases = vec![release(2025, 1, 5, 100.0), release(2025, 1, 20, -100.0)];
        let axis = months(&[(2025, 1), (2025, 2)]);
        assert!(accrue_ceiling(&releases, &axis).is_none());
    }

    #[test]
    fn test_ceiling_may_decrease() {
        let releases = vec![release(2025, 1, 1, 100.0), release(2025, 2, 1, -60.0)];
        let axis = months(&[(2025, 1), (2025, 2)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![100.0, 40.0]);
    }

    #[test]
    fn test_fractional_hours() {
        let releases = vec![release(2025, 1, 1, 100.5)];
        let axis = months(&[(2025, 1)]);
        let series = accrue_ceiling(&releases, &axis).unwrap();
        assert_eq!(series.ceiling, vec![100.5]);
        assert_eq!(series.threshold75, vec![75.375]);
    }

    #[test]
    fn test_empty_month_axis_is_absent() {
        let releases = vec![release(2025, 1, 1, 100.0)];
        assert!(accrue_ceiling(&releases, &[]).is_none());
    }
}
