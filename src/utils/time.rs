use chrono::{DateTime, Local, Utc};

/// Formats remaining countdown seconds the way the dashboard shows them, `MM:SS`.
pub fn format_countdown(remaining_seconds: u32) -> String {
    format!("{:02}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

/// `1 minute`, `3 minutes`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

pub fn format_local(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%x %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_countdown, format_minutes};

    #[test]
    fn countdown_is_zero_padded() {
        assert_eq!(format_countdown(300), "05:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(61), "01:01");
    }

    #[test]
    fn minutes_are_pluralized() {
        assert_eq!(format_minutes(1), "1 minute");
        assert_eq!(format_minutes(4), "4 minutes");
    }
}
