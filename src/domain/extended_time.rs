//! Extended-clock time handling.
//!
//! The calendar accepts clock input in the range 00:00-29:59, where 24:00
//! and later mean the small hours of the next calendar day ("25:30" is
//! 01:30 on the following date). Storage is always canonical (hour 0-23);
//! the extended form exists only at the input and display edges.

use chrono::{Days, NaiveDate, NaiveTime, Timelike};

use crate::infrastructure::error::ScheduleError;

/// Result of normalizing one extended-clock input against an anchor date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTime {
    /// Canonical wall-clock time, hour 0-23. `None` when the input was blank.
    pub time: Option<NaiveTime>,
    /// The calendar day the time landed on. Advanced by one day when the
    /// input hour was 24-29; otherwise the anchor date unchanged.
    pub date: Option<NaiveDate>,
}

/// Parses `"H:MM"`/`"HH:MM"` input with hour 0-29 into a canonical time,
/// advancing `date` by one day when the hour is 24-29.
///
/// Blank input is not an error: it yields no time and leaves the date
/// untouched.
pub fn parse_input(
    input: &str,
    date: Option<NaiveDate>,
) -> Result<NormalizedTime, ScheduleError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(NormalizedTime { time: None, date });
    }

    let invalid = || ScheduleError::InvalidTimeFormat(format!("'{input}' must be HH:MM (00-29)"));

    let mut split = input.split(':');
    let hour_str = split.next().ok_or_else(invalid)?;
    let minute_str = split.next().ok_or_else(invalid)?;
    if split.next().is_some() {
        return Err(invalid());
    }

    let mut hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;
    if hour > 29 || minute > 59 {
        return Err(invalid());
    }

    let mut date = date;
    if hour >= 24 {
        hour -= 24;
        date = date.and_then(|d| d.checked_add_days(Days::new(1)));
    }

    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
    Ok(NormalizedTime {
        time: Some(time),
        date,
    })
}

/// Renders a canonical time for display: hours 0-5 come back as 24-29
/// ("01:30" displays as "25:30"), everything else unchanged. `None`
/// renders as the empty string.
pub fn to_extended_display(time: Option<NaiveTime>) -> String {
    let Some(time) = time else {
        return String::new();
    };
    let mut hour = time.hour();
    if hour < 6 {
        hour += 24;
    }
    format!("{hour:02}:{:02}", time.minute())
}

/// Extended hour of a canonical time: 0-5 maps to 24-29.
pub fn extended_hour(time: NaiveTime) -> u32 {
    let hour = time.hour();
    if hour < 6 { hour + 24 } else { hour }
}

/// Minutes since the extended day start, for ordering. A 01:30 event
/// (extended 25:30) sorts after a 23:00 one on the same calendar entry.
pub fn extended_minutes(time: NaiveTime) -> u32 {
    extended_hour(time) * 60 + time.minute()
}
