//! # Duration Module - Clock Arithmetic and Formatting
//!
//! Helpers for turning pairs of wall-clock instants into whole-second
//! durations, and durations into the `mm:ss` / `hh:mm:ss` strings used
//! everywhere a time is shown to the user.
//!
//! All arithmetic is done on [`DateTime<Utc>`] values delivered by the
//! backend. Clock skew between client and server can make an interval come
//! out negative; those are clamped to zero rather than wrapping.
//!
//! ```rust
//! use gradus::duration::format_duration;
//!
//! assert_eq!(format_duration(65), "01:05");
//! assert_eq!(format_duration(3661), "01:01:01");
//! ```

use chrono::{DateTime, Utc};

use crate::Seconds;

/// Whole seconds between two instants, clamped to zero when `end` is before
/// `start`. Fractional seconds are floored.
///
/// * `start` - The earlier instant
/// * `end` - The later instant
///
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Seconds {
    (end - start).num_seconds().max(0) as Seconds
}

/// Formats a second count as `mm:ss`, switching to `hh:mm:ss` at one hour.
///
/// Both fields are zero-padded to two digits. Hours are not capped; a
/// hundred-hour duration simply widens the hour field.
pub fn format_duration(seconds: Seconds) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn test_format_under_an_hour() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(5), "00:05");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(600), "10:00");
        assert_eq!(format_duration(3599), "59:59");
    }

    #[test]
    fn test_format_an_hour_and_beyond() {
        assert_eq!(format_duration(3600), "01:00:00");
        assert_eq!(format_duration(3661), "01:01:01");
        assert_eq!(format_duration(7325), "02:02:05");
        // Hours are not capped at two digits
        assert_eq!(format_duration(100 * 3600), "100:00:00");
    }

    #[test]
    fn test_seconds_between() {
        assert_eq!(seconds_between(at(100), at(130)), 30);
        assert_eq!(seconds_between(at(0), at(0)), 0);
    }

    #[test]
    fn test_seconds_between_clamps_negative_spans() {
        // A server clock slightly ahead of the client must not produce a
        // wrapped duration
        assert_eq!(seconds_between(at(130), at(100)), 0);
    }

    #[test]
    fn test_seconds_between_floors_fractions() {
        let start = at(100);
        let end = DateTime::from_timestamp(101, 900_000_000).unwrap();
        assert_eq!(seconds_between(start, end), 1);
    }
}
