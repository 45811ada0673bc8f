use chrono::{DateTime, Utc};

/// Format duration in human-readable format
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Fraction of an entry already watched, clamped to 0..=1.
pub fn watch_fraction(current_secs: u64, duration_secs: u64) -> f32 {
    if duration_secs == 0 {
        return 0.0;
    }
    (current_secs as f32 / duration_secs as f32).clamp(0.0, 1.0)
}

/// Xtream delivers `added` as a unix-seconds string; render it as a date.
pub fn format_added(added: &str) -> Option<String> {
    let secs = added.trim().parse::<i64>().ok()?;
    let dt: DateTime<Utc> = DateTime::from_timestamp(secs, 0)?;
    Some(dt.format("%Y-%m-%d").to_string())
}
