//! Display formatting for timer values.

/// `HH:MM:SS` elapsed-time display.
pub fn format_hms(total_secs: i64) -> String {
    let secs = total_secs.max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Signed `MM:SS` remaining-time display.
///
/// Study overtime is negative and keeps its sign rather than clamping.
pub fn format_signed(remaining_secs: i64) -> String {
    let sign = if remaining_secs < 0 { "-" } else { "" };
    let secs = remaining_secs.abs();
    format!("{sign}{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formats_hours_minutes_seconds() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(3600 + 25 * 60 + 5), "01:25:05");
    }

    #[test]
    fn hms_clamps_negative_to_zero() {
        assert_eq!(format_hms(-10), "00:00:00");
    }

    #[test]
    fn signed_keeps_overtime_sign() {
        assert_eq!(format_signed(25 * 60), "25:00");
        assert_eq!(format_signed(-90), "-01:30");
        assert_eq!(format_signed(0), "00:00");
    }
}
