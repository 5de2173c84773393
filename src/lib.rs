//! Ruchisuke scheduling core.
//!
//! The calendar's "hard parts", stripped of UI: extended-clock time
//! normalization (a 25:30 entry is 01:30 on the next calendar day),
//! day-part classification for styling, the dated/undated view-model
//! projection, a live sync controller that re-fetches whole snapshots on
//! change notifications, and the validating mutation gateway in front of
//! the store.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::mutation_gateway::MutationGateway;
pub use application::sync_controller::{
    ScheduleSnapshot, SessionPhase, SyncController, SyncSession,
};
pub use domain::extended_time::{NormalizedTime, parse_input, to_extended_display};
pub use domain::models::{DayOffMarker, Event, EventDraft, EventId, EventKind, NewEvent, OwnerId};
pub use domain::time_zone::Zone;
pub use domain::view_model::{ScheduleView, month_grid};
pub use infrastructure::change_feed::{
    ChangeBroker, ChangeFeed, ChangeNotice, ChangeSubscription, ChangeTable, NotifyingStore,
};
pub use infrastructure::error::ScheduleError;
pub use infrastructure::schedule_store::{InMemoryScheduleStore, ScheduleStore};
pub use infrastructure::sqlite_store::SqliteScheduleStore;
pub use infrastructure::storage::initialize_database;
