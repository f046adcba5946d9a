// Utility functions
use chrono::{DateTime, TimeZone, Utc};

/// Converts a Unix timestamp in milliseconds to `DateTime<Utc>`, if valid.
pub fn millis_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(ms.round() as i64).single()
}

/// Converts a Unix timestamp in seconds to `DateTime<Utc>`, if valid.
pub fn secs_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    Utc.timestamp_opt(secs.round() as i64, 0).single()
}

/// `0.6915` -> `69%`
pub fn format_probability(p: f64) -> String {
    format!("{}%", (p * 100.0).round_ties_even() as i64)
}

/// `0.0123` -> `+1.23%`
pub fn format_signed_pct(ratio: f64) -> String {
    format!("{:+.2}%", ratio * 100.0)
}

/// `64250.5` -> `$64,250.50`
pub fn format_usd(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}
