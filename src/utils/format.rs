//! Clock formatting for elapsed workout and rest time

use serde_json::Value;

/// Coerce an arbitrary JSON value into a non-negative whole number of seconds.
///
/// Numbers are floored and clamped at zero, numeric strings are parsed the
/// same way, and everything else (null, booleans, garbage text, NaN) is zero.
pub fn coerce_seconds(value: &Value) -> u64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.floor() as u64,
        _ => 0,
    }
}

/// Format seconds as `HH:MM:SS`. Hours grow past two digits when needed.
pub fn format_clock_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock_ms(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_format_clock_hms() {
        assert_eq!(format_clock_hms(0), "00:00:00");
        assert_eq!(format_clock_hms(59), "00:00:59");
        assert_eq!(format_clock_hms(3661), "01:01:01");
        assert_eq!(format_clock_hms(359_999), "99:59:59");
        assert_eq!(format_clock_hms(360_000), "100:00:00");
    }

    #[test]
    fn test_format_clock_ms() {
        assert_eq!(format_clock_ms(0), "00:00");
        assert_eq!(format_clock_ms(95), "01:35");
        assert_eq!(format_clock_ms(6000), "100:00");
    }

    #[test]
    fn test_garbage_formats_as_zero() {
        for value in [json!(-5), json!(-0.5), json!("abc"), json!(null), json!(true), json!([1])] {
            let seconds = coerce_seconds(&value);
            assert_eq!(seconds, 0, "{value}");
            assert_eq!(format_clock_hms(seconds), "00:00:00");
            assert_eq!(format_clock_ms(seconds), "00:00");
        }
    }

    #[test]
    fn test_coerce_seconds_accepts_numeric_input() {
        assert_eq!(coerce_seconds(&json!(42)), 42);
        assert_eq!(coerce_seconds(&json!(42.9)), 42);
        assert_eq!(coerce_seconds(&json!(" 17 ")), 17);
        assert_eq!(coerce_seconds(&json!("")), 0);
    }

    proptest! {
        #[test]
        fn hms_parses_back_to_the_same_total(s in 0u64..360_000) {
            let text = format_clock_hms(s);
            let parts: Vec<u64> = text.split(':').map(|p| p.parse().unwrap()).collect();
            prop_assert_eq!(parts.len(), 3);
            prop_assert_eq!(parts[0] * 3600 + parts[1] * 60 + parts[2], s);
        }
    }
}
