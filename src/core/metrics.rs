use serde::Serialize;

use super::types::SeriesPoint;

/// Which way a KPI is expected to move when it improves.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Reads `field` from the last point, or `0.0` for an empty series.
pub fn latest_value<F>(points: &[SeriesPoint], field: F) -> f64
where
    F: Fn(&SeriesPoint) -> f64,
{
    points.last().map(field).unwrap_or(0.0)
}

pub fn delta_from_baseline(current: f64, baseline: f64) -> f64 {
    current - baseline
}

/// Signed rendering of a delta with a fixed number of decimals: `+43.0`,
/// `-2.0`, `0.0`. Values that round to zero never carry a sign.
pub fn format_delta(delta: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, delta.abs());
    let is_zero = rendered.chars().all(|c| c == '0' || c == '.');
    if is_zero {
        rendered
    } else if delta > 0.0 {
        format!("+{rendered}")
    } else {
        format!("-{rendered}")
    }
}

/// Whether the delta moved in the KPI's improving direction.
pub fn is_improvement(delta: f64, direction: Direction) -> bool {
    match direction {
        Direction::Up => delta > 0.0,
        Direction::Down => delta < 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(value: f64) -> SeriesPoint {
        SeriesPoint {
            period_label: "janv. 25".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
            value,
        }
    }

    #[test]
    fn latest_value_reads_last_point() {
        let points = vec![point(22.0), point(30.5), point(41.25)];
        assert_eq!(latest_value(&points, SeriesPoint::value), 41.25);
        assert_eq!(latest_value(&points, |p| p.value * 100.0), 4125.0);
    }

    #[test]
    fn latest_value_of_empty_series_is_zero() {
        assert_eq!(latest_value(&[], SeriesPoint::value), 0.0);
    }

    #[test]
    fn delta_is_plain_subtraction() {
        assert_eq!(delta_from_baseline(65.0, 22.0), 43.0);
        assert_eq!(delta_from_baseline(1.0, 3.0), -2.0);
    }

    #[test]
    fn delta_formatting_keeps_sign_consistent() {
        assert_eq!(format_delta(43.0, 1), "+43.0");
        assert_eq!(format_delta(-2.0, 0), "-2");
        assert_eq!(format_delta(0.0, 1), "0.0");
        assert_eq!(format_delta(-0.04, 1), "0.0");
        assert_eq!(format_delta(0.06, 1), "+0.1");
    }

    #[test]
    fn improvement_depends_on_direction() {
        assert!(is_improvement(5.0, Direction::Up));
        assert!(!is_improvement(5.0, Direction::Down));
        assert!(is_improvement(-0.08, Direction::Down));
        assert!(!is_improvement(0.0, Direction::Up));
    }
}
