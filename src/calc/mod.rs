pub mod ceiling;
pub mod chart;
pub mod holidays;
pub mod months;

pub use ceiling::{accrue_ceiling, CeilingSeries};
pub use chart::{generate_chart, ChartData, ChartError, ChartParams};
pub use holidays::{federal_holidays, named_holidays, HolidayCalendar};
pub use months::{month_keys, MonthKey};
