use chrono::{DateTime, Local, TimeZone, Utc};

/// Format an optional percentage (e.g. "42.5%"), or "-" when absent
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v),
        _ => "-".to_string(),
    }
}

/// Format an optional temperature in degrees Celsius
pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.0}°C", v),
        _ => "-".to_string(),
    }
}

/// Format a millisecond duration as hours and minutes (e.g. "3h 05m")
pub fn format_hours(ms: Option<f64>) -> String {
    let Some(ms) = ms.filter(|v| v.is_finite() && *v > 0.0) else {
        return "-".to_string();
    };

    let total_minutes = (ms / 60_000.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Format an epoch millisecond timestamp in local time (YYYY-MM-DD HH:MM)
pub fn format_timestamp(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(utc) => {
            let local: DateTime<Local> = utc.into();
            local.format("%Y-%m-%d %H:%M").to_string()
        }
        None => "-".to_string(),
    }
}

/// Format a UTC day start as a short label (e.g. "Mon 03")
pub fn format_day_label(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(utc) => utc.format("%a %d").to_string(),
        None => "-".to_string(),
    }
}
