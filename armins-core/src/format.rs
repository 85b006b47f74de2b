//! Formatting helpers shared across front ends.

use chrono::{DateTime, Local, Utc};

/// Calendar date in local time (e.g., "2025-04-02").
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// Hour and minute in local time (e.g., "08:30").
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    relative_to(ts, Utc::now())
}

fn relative_to(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Cut `s` to at most `max` characters, marking the cut with "…".
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time_buckets() {
        let now: DateTime<Utc> = "2025-04-02T12:00:00Z".parse().unwrap();
        assert_eq!(relative_to(now - Duration::seconds(5), now), "5s ago");
        assert_eq!(relative_to(now - Duration::minutes(3), now), "3m ago");
        assert_eq!(relative_to(now - Duration::hours(2), now), "2h ago");
        assert_eq!(relative_to(now - Duration::days(3), now), "3d ago");
        assert_eq!(relative_to(now - Duration::days(30), now), "Mar 03");
        assert_eq!(relative_to(now + Duration::seconds(5), now), "just now");
    }

    #[test]
    fn test_date_and_time_shapes() {
        let ts = Utc::now();
        assert_eq!(format_date(ts).len(), 10);
        assert_eq!(format_time(ts).len(), 5);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("argumentation", 5), "argu…");
        assert_eq!(truncate_chars("Überzeugung", 3), "Üb…");
    }
}
