use chrono;

/// Apply the power-of-ten exponent from a list entry scaler. An absent
/// scaler means exponent 0, the raw value passes through unchanged.
pub fn apply_scaler(raw: f64, scaler: Option<i8>) -> f64 {
    match scaler {
        Some(exponent) => raw * 10_f64.powi(exponent as i32),
        None => raw,
    }
}

/// SML sensor timestamps are seconds since epoch.
pub fn format_sensor_time(timestamp: Option<u32>) -> Option<String> {
    timestamp.map(|ts| {
        chrono::DateTime::from_timestamp(ts as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| format!("Invalid timestamp: {}", ts))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_scaler() {
        assert!((apply_scaler(12345.0, Some(-2)) - 123.45).abs() < 1e-9);
        assert_eq!(apply_scaler(5.0, Some(3)), 5000.0);
    }

    #[test]
    fn test_missing_scaler_is_identity() {
        assert_eq!(apply_scaler(163.0, None), 163.0);
        assert_eq!(apply_scaler(0.0, None), 0.0);
    }

    #[test]
    fn test_format_sensor_time() {
        assert_eq!(
            format_sensor_time(Some(0)),
            Some("1970-01-01 00:00:00 UTC".to_string())
        );
        assert_eq!(format_sensor_time(None), None);
    }
}
