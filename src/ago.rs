use chrono::{DateTime, Utc};

/// Formats how long ago `then` was, as seen from `now`, in the loose way people talk about it:
/// "a few seconds ago", "3 minutes ago", "a day ago".  The thresholds round generously, so 50
/// seconds is already "a minute" and 40 minutes is still "40 minutes".
///
/// A `then` later than `now` is treated as having just happened.
pub fn ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0) as f64;
    let minutes = seconds / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;
    let months = days / 30.4;
    let years = days / 365.0;

    if seconds < 45.0 {
        "a few seconds ago".to_string()
    } else if seconds < 90.0 {
        "a minute ago".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes ago", minutes.round().max(2.0) as i64)
    } else if minutes < 90.0 {
        "an hour ago".to_string()
    } else if hours < 22.0 {
        format!("{} hours ago", hours.round().max(2.0) as i64)
    } else if hours < 36.0 {
        "a day ago".to_string()
    } else if days < 26.0 {
        format!("{} days ago", days.round().max(2.0) as i64)
    } else if days < 45.0 {
        "a month ago".to_string()
    } else if days < 320.0 {
        format!("{} months ago", months.round().max(2.0) as i64)
    } else if days < 548.0 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", years.round().max(2.0) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ago_by(delta: Duration) -> String {
        let now = Utc::now();
        ago(now - delta, now)
    }

    #[test]
    fn seconds_and_minutes() {
        assert_eq!(ago_by(Duration::seconds(0)), "a few seconds ago");
        assert_eq!(ago_by(Duration::seconds(44)), "a few seconds ago");
        assert_eq!(ago_by(Duration::seconds(60)), "a minute ago");
        assert_eq!(ago_by(Duration::seconds(90)), "2 minutes ago");
        assert_eq!(ago_by(Duration::minutes(3)), "3 minutes ago");
        assert_eq!(ago_by(Duration::minutes(44)), "44 minutes ago");
    }

    #[test]
    fn hours_days_and_beyond() {
        assert_eq!(ago_by(Duration::minutes(60)), "an hour ago");
        assert_eq!(ago_by(Duration::hours(5)), "5 hours ago");
        assert_eq!(ago_by(Duration::hours(30)), "a day ago");
        assert_eq!(ago_by(Duration::days(10)), "10 days ago");
        assert_eq!(ago_by(Duration::days(30)), "a month ago");
        assert_eq!(ago_by(Duration::days(100)), "3 months ago");
        assert_eq!(ago_by(Duration::days(400)), "a year ago");
        assert_eq!(ago_by(Duration::days(1000)), "3 years ago");
    }

    #[test]
    fn the_future_is_now() {
        let now = Utc::now();
        assert_eq!(ago(now + Duration::minutes(5), now), "a few seconds ago");
    }
}
