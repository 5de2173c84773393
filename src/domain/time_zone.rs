//! Coarse day-part classification used to pick a display style per event.

use crate::domain::extended_time::extended_hour;
use crate::domain::models::Event;
use serde::{Deserialize, Serialize};

/// Day-part bucket for an event. All-day and sleep entries override the
/// clock; everything else buckets by extended start hour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    AllDay,
    Sleep,
    Morning,
    Noon,
    Night,
    Midnight,
    Other,
}

impl Zone {
    /// Classifies an event. Priority: all-day flag, sleep flag, missing
    /// start time, then the extended hour of the start time.
    pub fn of(event: &Event) -> Zone {
        if event.all_day {
            return Zone::AllDay;
        }
        if event.sleep {
            return Zone::Sleep;
        }
        let Some(start) = event.start_time else {
            return Zone::Other;
        };

        match extended_hour(start) {
            6..=11 => Zone::Morning,
            12..=17 => Zone::Noon,
            18..=23 => Zone::Night,
            // Canonical hours 0-5 project here.
            24..=29 => Zone::Midnight,
            _ => Zone::Other,
        }
    }

    /// Style hook matching the calendar's border classes.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::AllDay => "border-allday",
            Self::Sleep => "border-sleep",
            Self::Morning => "border-morning",
            Self::Noon => "border-noon",
            Self::Night => "border-night",
            Self::Midnight => "border-midnight",
            Self::Other => "border-other",
        }
    }
}
