//! Store contract for events and day-off markers, plus the in-memory
//! reference implementation used by tests and single-process setups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::models::{DayOffMarker, Event, EventId, NewEvent, OwnerId};
use crate::infrastructure::error::ScheduleError;

/// External event/day-off storage, always scoped by owner.
///
/// `list_*` results come back date-ascending with undated entries last,
/// but equal dates carry no ordering guarantee; the view-model builder
/// re-sorts by time.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_events(&self, owner: &OwnerId) -> Result<Vec<Event>, ScheduleError>;

    /// Inserts a normalized record and returns it with its assigned id.
    async fn insert_event(&self, record: NewEvent) -> Result<Event, ScheduleError>;

    /// Replaces the stored event with the same id and owner. Fails with
    /// `NotFound` when the id has vanished.
    async fn update_event(&self, event: &Event) -> Result<(), ScheduleError>;

    /// Removes the event. Fails with `NotFound` when the id is absent;
    /// callers racing a concurrent delete treat that as benign.
    async fn delete_event(&self, owner: &OwnerId, id: &EventId) -> Result<(), ScheduleError>;

    async fn list_day_off(&self, owner: &OwnerId) -> Result<Vec<DayOffMarker>, ScheduleError>;

    async fn get_day_off(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
    ) -> Result<Option<DayOffMarker>, ScheduleError>;

    /// Inserts or replaces the marker for (owner, date).
    async fn upsert_day_off(&self, marker: &DayOffMarker) -> Result<(), ScheduleError>;
}

#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    events: Mutex<HashMap<EventId, Event>>,
    day_off: Mutex<HashMap<(OwnerId, NaiveDate), bool>>,
    next_id: AtomicU64,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_event_id(&self) -> EventId {
        let sequence = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        EventId(sequence.to_string())
    }
}

fn lock_error(what: &str, error: impl std::fmt::Display) -> ScheduleError {
    ScheduleError::Store(format!("{what} lock poisoned: {error}"))
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn list_events(&self, owner: &OwnerId) -> Result<Vec<Event>, ScheduleError> {
        let events = self
            .events
            .lock()
            .map_err(|error| lock_error("events", error))?;
        let mut listed: Vec<Event> = events
            .values()
            .filter(|event| &event.owner == owner)
            .cloned()
            .collect();
        // Date ascending, undated last; ties deliberately unordered.
        listed.sort_by_key(|event| (event.date.is_none(), event.date));
        Ok(listed)
    }

    async fn insert_event(&self, record: NewEvent) -> Result<Event, ScheduleError> {
        let event = record.into_event(self.next_event_id());
        let mut events = self
            .events
            .lock()
            .map_err(|error| lock_error("events", error))?;
        events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn update_event(&self, event: &Event) -> Result<(), ScheduleError> {
        let mut events = self
            .events
            .lock()
            .map_err(|error| lock_error("events", error))?;
        match events.get_mut(&event.id) {
            Some(stored) if stored.owner == event.owner => {
                *stored = event.clone();
                Ok(())
            }
            _ => Err(ScheduleError::NotFound(format!(
                "event '{}'",
                event.id.as_str()
            ))),
        }
    }

    async fn delete_event(&self, owner: &OwnerId, id: &EventId) -> Result<(), ScheduleError> {
        let mut events = self
            .events
            .lock()
            .map_err(|error| lock_error("events", error))?;
        match events.get(id) {
            Some(stored) if &stored.owner == owner => {
                events.remove(id);
                Ok(())
            }
            _ => Err(ScheduleError::NotFound(format!("event '{}'", id.as_str()))),
        }
    }

    async fn list_day_off(&self, owner: &OwnerId) -> Result<Vec<DayOffMarker>, ScheduleError> {
        let day_off = self
            .day_off
            .lock()
            .map_err(|error| lock_error("day_off", error))?;
        let mut listed: Vec<DayOffMarker> = day_off
            .iter()
            .filter(|((marker_owner, _), _)| marker_owner == owner)
            .map(|((owner, date), is_off)| DayOffMarker {
                owner: owner.clone(),
                date: *date,
                is_off: *is_off,
            })
            .collect();
        listed.sort_by_key(|marker| marker.date);
        Ok(listed)
    }

    async fn get_day_off(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
    ) -> Result<Option<DayOffMarker>, ScheduleError> {
        let day_off = self
            .day_off
            .lock()
            .map_err(|error| lock_error("day_off", error))?;
        Ok(day_off
            .get(&(owner.clone(), date))
            .map(|is_off| DayOffMarker {
                owner: owner.clone(),
                date,
                is_off: *is_off,
            }))
    }

    async fn upsert_day_off(&self, marker: &DayOffMarker) -> Result<(), ScheduleError> {
        let mut day_off = self
            .day_off
            .lock()
            .map_err(|error| lock_error("day_off", error))?;
        day_off.insert((marker.owner.clone(), marker.date), marker.is_off);
        Ok(())
    }
}
