//! Validation and normalization in front of the store.
//!
//! Every write goes through here: drafts are checked against the domain
//! rules, extended-clock times are normalized to canonical storage form,
//! and only then does the external store see the record. Callers do not
//! patch local state from the result; the change feed drives view
//! updates.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::extended_time;
use crate::domain::models::{DayOffMarker, Event, EventDraft, EventId, NewEvent, OwnerId};
use crate::infrastructure::error::ScheduleError;
use crate::infrastructure::schedule_store::ScheduleStore;

pub struct MutationGateway {
    store: Arc<dyn ScheduleStore>,
    owner: OwnerId,
}

/// Canonical fields produced from one draft.
struct NormalizedDraft {
    date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn ScheduleStore>, owner: OwnerId) -> Self {
        Self { store, owner }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Validates and normalizes a draft, then inserts it. Returns the
    /// stored event with its assigned id.
    pub async fn create(&self, draft: &EventDraft) -> Result<Event, ScheduleError> {
        let normalized = self.normalize(draft)?;
        self.store
            .insert_event(NewEvent {
                owner: self.owner.clone(),
                title: draft.title.trim().to_string(),
                kind: draft.kind,
                category: clean_optional(&draft.category),
                date: normalized.date,
                start_time: normalized.start_time,
                end_time: normalized.end_time,
                all_day: draft.all_day,
                sleep: draft.sleep,
                summary: clean_optional(&draft.summary),
            })
            .await
    }

    /// Validates and normalizes a draft, then replaces the stored event.
    /// An id that vanished under a concurrent delete is a benign no-op.
    pub async fn update(&self, id: &EventId, draft: &EventDraft) -> Result<(), ScheduleError> {
        let normalized = self.normalize(draft)?;
        let event = Event {
            id: id.clone(),
            owner: self.owner.clone(),
            title: draft.title.trim().to_string(),
            kind: draft.kind,
            category: clean_optional(&draft.category),
            date: normalized.date,
            start_time: normalized.start_time,
            end_time: normalized.end_time,
            all_day: draft.all_day,
            sleep: draft.sleep,
            summary: clean_optional(&draft.summary),
        };
        match self.store.update_event(&event).await {
            Ok(()) => Ok(()),
            Err(ScheduleError::NotFound(_)) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Deletes by id. Racing another client's delete is a benign no-op.
    pub async fn delete(&self, id: &EventId) -> Result<(), ScheduleError> {
        match self.store.delete_event(&self.owner, id).await {
            Ok(()) => Ok(()),
            Err(ScheduleError::NotFound(_)) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Read-modify-write toggle: first call inserts `is_off = true`,
    /// later calls flip the flag. Concurrent togglers race last-write-wins.
    pub async fn toggle_day_off(&self, date: NaiveDate) -> Result<DayOffMarker, ScheduleError> {
        let existing = self.store.get_day_off(&self.owner, date).await?;
        let marker = DayOffMarker {
            owner: self.owner.clone(),
            date,
            is_off: existing.map_or(true, |marker| !marker.is_off),
        };
        self.store.upsert_day_off(&marker).await?;
        Ok(marker)
    }

    fn normalize(&self, draft: &EventDraft) -> Result<NormalizedDraft, ScheduleError> {
        draft.validate().map_err(ScheduleError::Validation)?;

        let date = parse_draft_date(&draft.date)?;
        let start = extended_time::parse_input(draft.start_time.as_deref().unwrap_or(""), date)?;

        // The start time decides which calendar day the event belongs to;
        // the end time is anchored to that same effective day, and its own
        // overflow past midnight does not move the date again.
        let effective_date = start.date;
        let end =
            extended_time::parse_input(draft.end_time.as_deref().unwrap_or(""), effective_date)?;

        Ok(NormalizedDraft {
            date: effective_date,
            start_time: start.time,
            end_time: end.time,
        })
    }
}

fn parse_draft_date(raw: &Option<String>) -> Result<Option<NaiveDate>, ScheduleError> {
    let Some(raw) = raw.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ScheduleError::Validation("event.date must be YYYY-MM-DD".to_string()))
}

fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::EventKind;
    use crate::infrastructure::schedule_store::InMemoryScheduleStore;
    use proptest::prelude::*;

    fn gateway() -> (Arc<InMemoryScheduleStore>, MutationGateway) {
        let store = Arc::new(InMemoryScheduleStore::new());
        let gateway = MutationGateway::new(Arc::clone(&store) as _, OwnerId::from("owner-1"));
        (store, gateway)
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            ..EventDraft::default()
        }
    }

    #[tokio::test]
    async fn create_normalizes_extended_start_time() {
        let (store, gateway) = gateway();
        let mut input = draft("Late session");
        input.date = Some("2024-11-29".to_string());
        input.start_time = Some("25:30".to_string());

        let event = gateway.create(&input).await.expect("create event");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 11, 30));
        assert_eq!(event.start_time, NaiveTime::from_hms_opt(1, 30, 0));

        let listed = store
            .list_events(&OwnerId::from("owner-1"))
            .await
            .expect("list");
        assert_eq!(listed, vec![event]);
    }

    #[tokio::test]
    async fn end_time_is_anchored_to_the_advanced_day() {
        let (_, gateway) = gateway();
        let mut input = draft("Overnight");
        input.date = Some("2024-05-01".to_string());
        input.start_time = Some("25:00".to_string());
        input.end_time = Some("26:30".to_string());

        let event = gateway.create(&input).await.expect("create event");
        // Start 25:00 moved the event to May 2nd; the end's own overflow
        // must not push the date to May 3rd.
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(event.start_time, NaiveTime::from_hms_opt(1, 0, 0));
        assert_eq!(event.end_time, NaiveTime::from_hms_opt(2, 30, 0));
    }

    #[tokio::test]
    async fn empty_title_fails_before_the_store_is_touched() {
        let (store, gateway) = gateway();
        let error = gateway.create(&draft("   ")).await.unwrap_err();
        assert!(matches!(error, ScheduleError::Validation(_)));
        assert!(
            store
                .list_events(&OwnerId::from("owner-1"))
                .await
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn mismatched_category_is_rejected() {
        let (_, gateway) = gateway();
        let mut input = draft("Bad pairing");
        input.kind = Some(EventKind::RealLife);
        input.category = Some("🐺".to_string());

        let error = gateway.create(&input).await.unwrap_err();
        assert!(matches!(error, ScheduleError::Validation(_)));
    }

    #[tokio::test]
    async fn malformed_time_is_invalid_time_format() {
        let (_, gateway) = gateway();
        let mut input = draft("Too late");
        input.start_time = Some("30:00".to_string());

        let error = gateway.create(&input).await.unwrap_err();
        assert!(matches!(error, ScheduleError::InvalidTimeFormat(_)));
    }

    #[tokio::test]
    async fn update_of_vanished_event_is_a_no_op() {
        let (_, gateway) = gateway();
        gateway
            .update(&EventId::from("999"), &draft("Ghost"))
            .await
            .expect("vanished update is benign");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, gateway) = gateway();
        let event = gateway.create(&draft("Short-lived")).await.expect("create");

        gateway.delete(&event.id).await.expect("first delete");
        gateway.delete(&event.id).await.expect("second delete is benign");
    }

    #[tokio::test]
    async fn toggle_day_off_inserts_then_flips() {
        let (store, gateway) = gateway();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");

        let first = gateway.toggle_day_off(date).await.expect("first toggle");
        assert!(first.is_off);

        let second = gateway.toggle_day_off(date).await.expect("second toggle");
        assert!(!second.is_off);

        let stored = store
            .get_day_off(&OwnerId::from("owner-1"), date)
            .await
            .expect("get marker")
            .expect("marker exists");
        assert!(!stored.is_off);
    }

    proptest! {
        // Double toggle always lands back on the starting value.
        #[test]
        fn double_toggle_is_identity(initial in proptest::option::of(any::<bool>())) {
            let runtime = tokio::runtime::Runtime::new().expect("runtime");
            runtime.block_on(async move {
                let (store, gateway) = gateway();
                let owner = OwnerId::from("owner-1");
                let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");

                if let Some(is_off) = initial {
                    store
                        .upsert_day_off(&DayOffMarker { owner: owner.clone(), date, is_off })
                        .await
                        .expect("seed marker");
                }

                gateway.toggle_day_off(date).await.expect("first toggle");
                gateway.toggle_day_off(date).await.expect("second toggle");

                let stored = store
                    .get_day_off(&owner, date)
                    .await
                    .expect("get marker")
                    .map(|marker| marker.is_off);
                // An absent marker reads as "not off".
                assert_eq!(stored.unwrap_or(false), initial.unwrap_or(false));
            });
        }
    }
}
