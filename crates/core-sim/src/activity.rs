use time::OffsetDateTime;

/// Relative market activity per UTC hour.
const HOUR_ACTIVITY: [f64; 24] = [
    0.6, 0.5, 0.4, 0.4, 0.5, 0.6, 0.7, 0.8, //
    0.9, 1.0, 1.1, 1.2, 1.3, 1.4, 1.3, 1.2, //
    1.1, 1.0, 0.9, 0.8, 0.7, 0.6, 0.6, 0.6,
];

/// Relative market activity per weekday, Sunday first.
const DAY_ACTIVITY: [f64; 7] = [1.0, 1.1, 1.2, 1.1, 1.0, 0.9, 0.8];

const ACTIVITY_DAMPING: f64 = 0.6;

/// Volatility multiplier for a candle timestamp (unix ms, UTC).
pub fn activity_multiplier(time_ms: i64) -> f64 {
    let Ok(at) = OffsetDateTime::from_unix_timestamp_nanos(i128::from(time_ms) * 1_000_000) else {
        return ACTIVITY_DAMPING;
    };

    let hour = HOUR_ACTIVITY[usize::from(at.hour())];
    let day = DAY_ACTIVITY[usize::from(at.weekday().number_days_from_sunday())];

    hour * day * ACTIVITY_DAMPING
}

#[cfg(test)]
mod tests {
    use super::activity_multiplier;

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn epoch_is_thursday_midnight() {
        // 1970-01-01 was a Thursday: 0.6 * 1.0 * 0.6
        let multiplier = activity_multiplier(0);
        assert!((multiplier - 0.36).abs() < 1e-12);
    }

    #[test]
    fn european_afternoon_is_the_busiest_hour() {
        let thursday_13h = activity_multiplier(13 * HOUR_MS);
        let thursday_03h = activity_multiplier(3 * HOUR_MS);

        assert!((thursday_13h - 1.4 * 1.0 * 0.6).abs() < 1e-12);
        assert!(thursday_13h > thursday_03h);
    }

    #[test]
    fn multiplier_stays_within_table_bounds() {
        for hour in 0..(24 * 7) {
            let multiplier = activity_multiplier(hour * HOUR_MS);
            assert!((0.4 * 0.8 * 0.6..=1.4 * 1.2 * 0.6 + 1e-12).contains(&multiplier));
        }
    }

    #[test]
    fn out_of_range_timestamp_falls_back_to_neutral_activity() {
        assert_eq!(activity_multiplier(i64::MAX), 0.6);
    }
}
