use chrono::{Datelike, Months, NaiveDate};

/// The reporting period a run is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDate {
    /// `YYYY-MM-DD`, always the first of a month.
    pub iso: String,
    /// `YYYYMM`, used in output file names.
    pub month: String,
}

impl ReportDate {
    /// First day of the month two months before `today`.
    pub fn from_today(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        // only fails for dates near NaiveDate::MIN
        let period = first.checked_sub_months(Months::new(2)).unwrap_or(first);
        Self::from_period_start(period)
    }

    pub fn from_period_start(period: NaiveDate) -> Self {
        Self {
            iso: period.format("%Y-%m-%d").to_string(),
            month: period.format("%Y%m").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn steps_back_two_months_to_month_start() {
        let rd = ReportDate::from_today(date(2024, 5, 17));
        assert_eq!(rd.iso, "2024-03-01");
        assert_eq!(rd.month, "202403");
    }

    #[test]
    fn crosses_year_boundary() {
        let rd = ReportDate::from_today(date(2024, 2, 29));
        assert_eq!(rd.iso, "2023-12-01");
        assert_eq!(rd.month, "202312");

        assert_eq!(ReportDate::from_today(date(2025, 1, 1)).iso, "2024-11-01");
    }

    #[test]
    fn month_end_days_do_not_skew() {
        // truncation happens before the subtraction
        assert_eq!(ReportDate::from_today(date(2024, 7, 31)).iso, "2024-05-01");
    }
}
