//! Projection of the raw event snapshot into render-ready view state.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::domain::extended_time::extended_minutes;
use crate::domain::models::Event;

/// Sort key for timeless entries: after every real clock value.
const NO_TIME: u32 = u32::MAX;

/// Derived view state: a per-day partition for the month grid and the
/// undated list for the side panel. Pure projection, no side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleView {
    /// Dated events keyed by calendar day, each bucket sorted by extended
    /// start time (a stored 01:30 sorts as 25:30, after the evening).
    pub by_day: BTreeMap<NaiveDate, Vec<Event>>,
    /// Events with no date yet, timed entries first.
    pub undated: Vec<Event>,
}

impl ScheduleView {
    /// Builds the view from a snapshot. When `today` is given, dated
    /// entries strictly before it are dropped; undated entries never are.
    pub fn build(events: &[Event], today: Option<NaiveDate>) -> ScheduleView {
        let mut by_day: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
        let mut undated: Vec<Event> = Vec::new();

        for event in events {
            match event.date {
                Some(date) => {
                    if today.is_some_and(|today| date < today) {
                        continue;
                    }
                    by_day.entry(date).or_default().push(event.clone());
                }
                None => undated.push(event.clone()),
            }
        }

        // Stable sorts keep insertion order for equal keys.
        for bucket in by_day.values_mut() {
            bucket.sort_by_key(sort_key);
        }
        undated.sort_by_key(sort_key);

        ScheduleView { by_day, undated }
    }

    /// Events scheduled on one calendar day, in display order.
    pub fn events_on(&self, date: NaiveDate) -> &[Event] {
        self.by_day.get(&date).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty() && self.undated.is_empty()
    }
}

fn sort_key(event: &Event) -> u32 {
    event.start_time.map_or(NO_TIME, extended_minutes)
}

/// The Monday-aligned run of days covering a month, for grid rendering:
/// from the Monday on or before the 1st through the Sunday on or after
/// the last day.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first
        .checked_add_months(chrono::Months::new(1))?
        .pred_opt()?;

    let lead = first.weekday().num_days_from_monday() as u64;
    let trail = Weekday::Sun.num_days_from_monday() as u64 - last.weekday().num_days_from_monday() as u64;

    let start = first.checked_sub_days(Days::new(lead))?;
    let end = last.checked_add_days(Days::new(trail))?;

    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        day = day.succ_opt()?;
    }
    Some(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EventId, OwnerId};
    use chrono::NaiveTime;

    fn event(id: &str, date: Option<&str>, start: Option<&str>) -> Event {
        Event {
            id: EventId::from(id),
            owner: OwnerId::from("owner-1"),
            title: id.to_string(),
            kind: None,
            category: None,
            date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").expect("valid date")),
            start_time: start
                .map(|s| NaiveTime::parse_from_str(s, "%H:%M").expect("valid time")),
            end_time: None,
            all_day: false,
            sleep: false,
            summary: None,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn partitions_dated_and_undated() {
        let events = vec![
            event("a", Some("2024-05-01"), Some("09:00")),
            event("b", Some("2024-05-01"), Some("02:00")),
            event("x", None, None),
        ];

        let view = ScheduleView::build(&events, None);

        let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        // The 02:00 entry reads as extended 26:00 and sorts after 09:00.
        assert_eq!(ids(view.events_on(day)), vec!["a", "b"]);
        assert_eq!(ids(&view.undated), vec!["x"]);
    }

    #[test]
    fn same_time_keeps_insertion_order() {
        let events = vec![
            event("first", Some("2024-05-01"), Some("10:00")),
            event("second", Some("2024-05-01"), Some("10:00")),
            event("third", Some("2024-05-01"), None),
        ];

        let view = ScheduleView::build(&events, None);
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        // Timeless entries land after timed ones.
        assert_eq!(ids(view.events_on(day)), vec!["first", "second", "third"]);
    }

    #[test]
    fn undated_sorts_timed_entries_first() {
        let events = vec![
            event("late", None, Some("01:00")),
            event("note", None, None),
            event("morning", None, Some("08:00")),
        ];

        let view = ScheduleView::build(&events, None);
        // Extended 25:00 sorts after 08:00; the timeless entry stays last.
        assert_eq!(ids(&view.undated), vec!["morning", "late", "note"]);
    }

    #[test]
    fn today_filter_drops_past_days_but_not_undated() {
        let events = vec![
            event("past", Some("2024-04-30"), None),
            event("today", Some("2024-05-01"), None),
            event("future", Some("2024-05-02"), None),
            event("x", None, None),
        ];

        let today = NaiveDate::from_ymd_opt(2024, 5, 1);
        let view = ScheduleView::build(&events, today);

        assert!(!view.by_day.contains_key(&NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()));
        assert_eq!(view.by_day.len(), 2);
        assert_eq!(ids(&view.undated), vec!["x"]);
    }

    #[test]
    fn empty_snapshot_builds_empty_view() {
        let view = ScheduleView::build(&[], None);
        assert!(view.is_empty());
        assert!(view.events_on(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).is_empty());
    }

    #[test]
    fn month_grid_covers_full_weeks() {
        // November 2024: the 1st is a Friday, the 30th a Saturday.
        let days = month_grid(2024, 11).expect("valid month");
        assert_eq!(days.first().copied(), NaiveDate::from_ymd_opt(2024, 10, 28));
        assert_eq!(days.last().copied(), NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(days.len() % 7, 0);
        assert_eq!(days.first().unwrap().weekday(), Weekday::Mon);
        assert_eq!(days.last().unwrap().weekday(), Weekday::Sun);
    }
}
