pub mod change_feed;
pub mod error;
pub mod schedule_store;
pub mod sqlite_store;
pub mod storage;
