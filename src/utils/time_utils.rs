use chrono::NaiveTime;

/// Whole minutes from a non-negative second count, rounding half up.
pub fn round_to_minutes(seconds: i64) -> i64 {
    (seconds.max(0) + 30) / 60
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a minute count as `"{h}h {m}m"`.
pub fn format_minutes(total_minutes: i64) -> String {
    let total_minutes = total_minutes.max(0);
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Arithmetic mean of minutes-since-midnight values as a time of day.
///
/// Business hours never wrap past midnight, so a plain mean is used rather
/// than a circular one; 23:50 and 00:10 average to 12:00, not 00:00.
pub fn average_time_of_day(minutes: &[u32]) -> Option<NaiveTime> {
    if minutes.is_empty() {
        return None;
    }
    let sum: u64 = minutes.iter().map(|m| u64::from(*m)).sum();
    let mean = (sum as f64 / minutes.len() as f64).round() as u32;
    NaiveTime::from_hms_opt(mean / 60, mean % 60, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_round_half_up() {
        assert_eq!(round_to_minutes(0), 0);
        assert_eq!(round_to_minutes(29), 0);
        assert_eq!(round_to_minutes(30), 1);
        assert_eq!(round_to_minutes(4200), 70);
        assert_eq!(round_to_minutes(-90), 0);
    }

    #[test]
    fn two_decimal_rounding() {
        assert_eq!(round2(20.0 / 30.0 * 100.0), 66.67);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(2.5), 2.5);
    }

    #[test]
    fn minute_formatting() {
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(70), "1h 10m");
        assert_eq!(format_minutes(600), "10h 0m");
    }

    #[test]
    fn average_is_arithmetic_not_circular() {
        assert_eq!(average_time_of_day(&[]), None);
        assert_eq!(
            average_time_of_day(&[7 * 60 + 50, 8 * 60 + 10]),
            NaiveTime::from_hms_opt(8, 0, 0)
        );
        assert_eq!(
            average_time_of_day(&[23 * 60 + 50, 10]),
            NaiveTime::from_hms_opt(12, 0, 0)
        );
    }
}
