//! Owner-scoped live synchronization between the store and local readers.
//!
//! The controller owns the authoritative in-memory snapshot for one bound
//! owner. Every change notification (and every manual refresh request)
//! funnels into the same serialized full re-fetch; the snapshot is only
//! ever replaced wholesale, never patched, so readers observe either the
//! last good state or a strictly newer one.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::models::{DayOffMarker, Event, OwnerId};
use crate::domain::view_model::ScheduleView;
use crate::infrastructure::change_feed::{ChangeFeed, ChangeSubscription};
use crate::infrastructure::error::ScheduleError;
use crate::infrastructure::schedule_store::ScheduleStore;

/// Lifecycle of one owner session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No fetch has started yet.
    Idle,
    /// A full read is in flight.
    Loading,
    /// The published snapshot matches the last successful full read.
    Synced,
    /// The session ended; the subscription is released.
    Unsubscribed,
}

/// The full fetched state for one owner. Replaced atomically on every
/// successful re-fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    pub events: Vec<Event>,
    pub day_off: Vec<DayOffMarker>,
}

impl ScheduleSnapshot {
    /// Projects the snapshot into render-ready view state.
    pub fn view(&self, today: Option<NaiveDate>) -> ScheduleView {
        ScheduleView::build(&self.events, today)
    }

    pub fn is_day_off(&self, date: NaiveDate) -> bool {
        self.day_off
            .iter()
            .any(|marker| marker.date == date && marker.is_off)
    }
}

/// Factory binding owners to live sessions over a shared store and feed.
pub struct SyncController {
    store: Arc<dyn ScheduleStore>,
    feed: Arc<dyn ChangeFeed>,
}

impl SyncController {
    pub fn new(store: Arc<dyn ScheduleStore>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { store, feed }
    }

    /// Starts a session for the owner: subscribes to the change feed,
    /// kicks off the initial full read, and keeps re-fetching on every
    /// notice until the session is closed or dropped.
    pub fn bind(&self, owner: OwnerId) -> SyncSession {
        let subscription = self.feed.subscribe(&owner);
        let (snapshot_tx, snapshot_rx) = watch::channel::<Option<ScheduleSnapshot>>(None);
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Idle);
        let phase_tx = Arc::new(phase_tx);
        // Capacity 1: a trigger arriving while one is already pending
        // carries no extra information.
        let (refresh_tx, refresh_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(run_session(
            Arc::clone(&self.store),
            owner.clone(),
            subscription,
            snapshot_tx,
            Arc::clone(&phase_tx),
            refresh_rx,
        ));

        SyncSession {
            owner,
            snapshot_rx,
            phase_rx,
            phase_tx,
            refresh_tx,
            task,
        }
    }
}

/// A bound owner session. Dropping it aborts the background task, so a
/// late fetch for a stale owner can never leak into a newer binding.
pub struct SyncSession {
    owner: OwnerId,
    snapshot_rx: watch::Receiver<Option<ScheduleSnapshot>>,
    phase_rx: watch::Receiver<SessionPhase>,
    phase_tx: Arc<watch::Sender<SessionPhase>>,
    refresh_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncSession {
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// The last successfully fetched snapshot, if any fetch has landed.
    pub fn snapshot(&self) -> Option<ScheduleSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase_rx.borrow()
    }

    /// A receiver that yields on every snapshot replacement.
    pub fn watch_snapshot(&self) -> watch::Receiver<Option<ScheduleSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Asks for a full re-fetch. Collapses into an already pending
    /// trigger when one exists.
    pub fn request_refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }

    /// Waits until the session has a published snapshot and is in sync.
    pub async fn wait_synced(&mut self) -> Result<(), ScheduleError> {
        self.phase_rx
            .wait_for(|phase| *phase == SessionPhase::Synced)
            .await
            .map_err(|_| ScheduleError::Store("session ended before syncing".to_string()))?;
        Ok(())
    }

    /// Ends the session and releases the subscription.
    pub fn close(self) {}
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.task.abort();
        let _ = self.phase_tx.send(SessionPhase::Unsubscribed);
    }
}

async fn run_session(
    store: Arc<dyn ScheduleStore>,
    owner: OwnerId,
    mut subscription: ChangeSubscription,
    snapshot_tx: watch::Sender<Option<ScheduleSnapshot>>,
    phase_tx: Arc<watch::Sender<SessionPhase>>,
    mut refresh_rx: mpsc::Receiver<()>,
) {
    loop {
        let _ = phase_tx.send(SessionPhase::Loading);

        match fetch_snapshot(store.as_ref(), &owner).await {
            Ok(snapshot) => {
                let _ = snapshot_tx.send(Some(snapshot));
                let _ = phase_tx.send(SessionPhase::Synced);
            }
            Err(error) => {
                // Stale-but-consistent beats empty: keep whatever was
                // published last and stay reachable for the next notice.
                warn!(
                    owner = owner.as_str(),
                    error = %error,
                    "full re-fetch failed; keeping last snapshot"
                );
                if snapshot_tx.borrow().is_some() {
                    let _ = phase_tx.send(SessionPhase::Synced);
                }
            }
        }

        // Block until something changes. Notices that piled up while the
        // fetch above was in flight resolve this select immediately.
        let ended = tokio::select! {
            notice = subscription.recv() => notice.is_none(),
            trigger = refresh_rx.recv() => trigger.is_none(),
        };
        if ended {
            break;
        }

        // Coalesce the backlog: everything queued so far is covered by
        // the single fetch the next loop iteration performs.
        subscription.drain();
        while refresh_rx.try_recv().is_ok() {}
        debug!(owner = owner.as_str(), "change detected, re-fetching");
    }

    let _ = phase_tx.send(SessionPhase::Unsubscribed);
}

async fn fetch_snapshot(
    store: &dyn ScheduleStore,
    owner: &OwnerId,
) -> Result<ScheduleSnapshot, ScheduleError> {
    let events = store.list_events(owner).await?;
    let day_off = store.list_day_off(owner).await?;
    Ok(ScheduleSnapshot { events, day_off })
}
