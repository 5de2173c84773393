//! Change notifications: "something changed for this owner, re-read".
//!
//! The feed carries no diff payload and makes no ordering promise between
//! tables; delivery is at-least-once. Consumers are expected to respond
//! with a full re-fetch, which makes duplicate notices harmless.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::domain::models::{DayOffMarker, Event, EventId, NewEvent, OwnerId};
use crate::infrastructure::error::ScheduleError;
use crate::infrastructure::schedule_store::ScheduleStore;

/// Which table a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTable {
    Events,
    DayOff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub owner: OwnerId,
    pub table: ChangeTable,
}

/// A source of change notices scoped to one owner.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, owner: &OwnerId) -> ChangeSubscription;
}

/// An open subscription. Dropping it releases the slot in the broker.
pub struct ChangeSubscription {
    receiver: mpsc::UnboundedReceiver<ChangeNotice>,
}

impl ChangeSubscription {
    /// Waits for the next notice. `None` means the feed shut down.
    pub async fn recv(&mut self) -> Option<ChangeNotice> {
        self.receiver.recv().await
    }

    /// Discards every notice already queued. Used to coalesce a burst of
    /// notifications into a single re-fetch.
    pub fn drain(&mut self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

/// In-memory per-owner fan-out. Cheap to clone; clones share subscribers.
#[derive(Clone, Default)]
pub struct ChangeBroker {
    subscribers: Arc<Mutex<HashMap<OwnerId, Vec<mpsc::UnboundedSender<ChangeNotice>>>>>,
}

impl ChangeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a notice to every live subscriber for the owner. Closed
    /// subscriptions are pruned as they are encountered.
    pub fn publish(&self, owner: &OwnerId, table: ChangeTable) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        if let Some(senders) = subscribers.get_mut(owner) {
            senders.retain(|sender| {
                sender
                    .send(ChangeNotice {
                        owner: owner.clone(),
                        table,
                    })
                    .is_ok()
            });
            if senders.is_empty() {
                subscribers.remove(owner);
            }
        }
    }
}

impl ChangeFeed for ChangeBroker {
    fn subscribe(&self, owner: &OwnerId) -> ChangeSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.entry(owner.clone()).or_default().push(sender);
        }
        ChangeSubscription { receiver }
    }
}

/// Write-through wrapper that publishes a change notice after every
/// successful mutation on the inner store. Pairing this with a
/// [`ChangeBroker`] gives any plain store a live feed.
pub struct NotifyingStore<S> {
    inner: S,
    broker: ChangeBroker,
}

impl<S: ScheduleStore> NotifyingStore<S> {
    pub fn new(inner: S, broker: ChangeBroker) -> Self {
        Self { inner, broker }
    }

    pub fn broker(&self) -> &ChangeBroker {
        &self.broker
    }
}

#[async_trait]
impl<S: ScheduleStore> ScheduleStore for NotifyingStore<S> {
    async fn list_events(&self, owner: &OwnerId) -> Result<Vec<Event>, ScheduleError> {
        self.inner.list_events(owner).await
    }

    async fn insert_event(&self, record: NewEvent) -> Result<Event, ScheduleError> {
        let owner = record.owner.clone();
        let event = self.inner.insert_event(record).await?;
        self.broker.publish(&owner, ChangeTable::Events);
        Ok(event)
    }

    async fn update_event(&self, event: &Event) -> Result<(), ScheduleError> {
        self.inner.update_event(event).await?;
        self.broker.publish(&event.owner, ChangeTable::Events);
        Ok(())
    }

    async fn delete_event(&self, owner: &OwnerId, id: &EventId) -> Result<(), ScheduleError> {
        self.inner.delete_event(owner, id).await?;
        self.broker.publish(owner, ChangeTable::Events);
        Ok(())
    }

    async fn list_day_off(&self, owner: &OwnerId) -> Result<Vec<DayOffMarker>, ScheduleError> {
        self.inner.list_day_off(owner).await
    }

    async fn get_day_off(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
    ) -> Result<Option<DayOffMarker>, ScheduleError> {
        self.inner.get_day_off(owner, date).await
    }

    async fn upsert_day_off(&self, marker: &DayOffMarker) -> Result<(), ScheduleError> {
        self.inner.upsert_day_off(marker).await?;
        self.broker.publish(&marker.owner, ChangeTable::DayOff);
        Ok(())
    }
}

impl<S: ScheduleStore> ChangeFeed for NotifyingStore<S> {
    fn subscribe(&self, owner: &OwnerId) -> ChangeSubscription {
        self.broker.subscribe(owner)
    }
}
