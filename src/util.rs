use chrono::{DateTime, Duration, Utc};

/// Round a timestamp down to the start of its UTC hour.
pub fn floor_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp().div_euclid(3600) * 3600;
    DateTime::from_timestamp(secs, 0).unwrap_or(ts)
}

/// Format an age as a compact human string: "3d 4h", "17h", "0h".
pub fn format_age(age: Duration) -> String {
    let total_hours = age.num_hours().max(0);
    let days = total_hours / 24;
    let hours = total_hours % 24;

    if days > 0 {
        format!("{days}d {hours}h")
    } else {
        format!("{hours}h")
    }
}
