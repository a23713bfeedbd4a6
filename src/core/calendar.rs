use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

const FR_MONTHS: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

const EN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

/// Advances `start` by `months` calendar months, keeping its day of month.
///
/// Days past the end of the landing month spill into the next one, so
/// January 31st plus one month is March 3rd (or March 2nd in a leap year).
/// Returns `None` when the result leaves chrono's supported range.
pub fn add_months_rollover(start: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = i64::from(start.year()) * 12 + i64::from(start.month0()) + i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_days(Days::new(u64::from(start.day0())))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Abbreviated month plus two-digit year, e.g. `janv. 25` or `Jan 25`.
pub fn period_label(date: NaiveDate, locale: Locale) -> String {
    let months = match locale {
        Locale::Fr => &FR_MONTHS,
        Locale::En => &EN_MONTHS,
    };
    let year = date.year().rem_euclid(100);
    format!("{} {year:02}", months[date.month0() as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn adds_months_across_year_boundary() {
        assert_eq!(add_months_rollover(ymd(2025, 11, 1), 3), Some(ymd(2026, 2, 1)));
        assert_eq!(add_months_rollover(ymd(2025, 1, 15), 0), Some(ymd(2025, 1, 15)));
        assert_eq!(add_months_rollover(ymd(2025, 1, 1), 24), Some(ymd(2027, 1, 1)));
    }

    #[test]
    fn overflowing_day_rolls_into_following_month() {
        assert_eq!(add_months_rollover(ymd(2025, 1, 31), 1), Some(ymd(2025, 3, 3)));
        assert_eq!(add_months_rollover(ymd(2024, 1, 31), 1), Some(ymd(2024, 3, 2)));
        assert_eq!(add_months_rollover(ymd(2025, 3, 31), 1), Some(ymd(2025, 5, 1)));
    }

    #[test]
    fn rollover_fails_outside_calendar_range() {
        assert_eq!(add_months_rollover(NaiveDate::MAX, 12), None);
    }

    #[test]
    fn labels_follow_locale() {
        assert_eq!(period_label(ymd(2025, 1, 1), Locale::Fr), "janv. 25");
        assert_eq!(period_label(ymd(2026, 8, 1), Locale::Fr), "août 26");
        assert_eq!(period_label(ymd(2027, 12, 31), Locale::Fr), "déc. 27");
        assert_eq!(period_label(ymd(2025, 9, 30), Locale::En), "Sep 25");
        assert_eq!(period_label(ymd(2105, 3, 1), Locale::En), "Mar 05");
    }

    #[test]
    fn first_of_month_truncates_day() {
        assert_eq!(first_of_month(ymd(2026, 10, 16)), ymd(2026, 10, 1));
    }
}
