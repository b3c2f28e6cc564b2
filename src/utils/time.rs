use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Format of the timestamp written in front of every log line.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the timestamp embedded into log file names.
pub const FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// This is the standard way of converting an event moment to a string. Sub-second precision is
/// dropped.
pub fn event_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    time.format(EVENT_TIME_FORMAT).to_string()
}

pub fn file_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    time.format(FILE_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{event_time, file_time};

    #[test]
    fn formats_drop_subseconds() {
        let time = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_milli_opt(7, 5, 3, 999)
                .unwrap(),
        );

        assert_eq!(event_time(&time), "2024-03-09 07:05:03");
        assert_eq!(file_time(&time), "2024-03-09_070503");
    }
}
