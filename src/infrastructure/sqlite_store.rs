//! SQLite-backed [`ScheduleStore`].
//!
//! Connections are opened per call; state lives entirely in the database
//! file, so the store itself stays `Send + Sync` without locking.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::models::{DayOffMarker, Event, EventId, EventKind, NewEvent, OwnerId};
use crate::infrastructure::error::ScheduleError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone)]
pub struct SqliteScheduleStore {
    db_path: PathBuf,
}

impl SqliteScheduleStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, ScheduleError> {
        Connection::open(&self.db_path).map_err(ScheduleError::from)
    }
}

type EventRow = (
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    bool,
    bool,
    Option<String>,
);

fn event_from_row(row: EventRow) -> Result<Event, ScheduleError> {
    let (id, owner, title, kind, category, date, start_time, end_time, all_day, sleep, summary) =
        row;
    let kind = match kind.as_deref() {
        None => None,
        Some(raw) => Some(EventKind::from_str_opt(raw).ok_or_else(|| {
            ScheduleError::Store(format!("unknown event kind '{raw}' for event {id}"))
        })?),
    };
    Ok(Event {
        id: EventId(id.to_string()),
        owner: OwnerId(owner),
        title,
        kind,
        category,
        date: date.as_deref().map(parse_date).transpose()?,
        start_time: start_time.as_deref().map(parse_time).transpose()?,
        end_time: end_time.as_deref().map(parse_time).transpose()?,
        all_day,
        sleep,
        summary,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|error| ScheduleError::Store(format!("invalid stored date '{raw}': {error}")))
}

fn parse_time(raw: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|error| ScheduleError::Store(format!("invalid stored time '{raw}': {error}")))
}

fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn time_to_sql(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}

fn event_id_to_sql(id: &EventId) -> Result<i64, ScheduleError> {
    id.as_str()
        .parse::<i64>()
        .map_err(|_| ScheduleError::NotFound(format!("event '{}'", id.as_str())))
}

#[async_trait]
impl super::schedule_store::ScheduleStore for SqliteScheduleStore {
    async fn list_events(&self, owner: &OwnerId) -> Result<Vec<Event>, ScheduleError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, owner, title, kind, category, date, start_time, end_time,
                    all_day, sleep, summary
             FROM events
             WHERE owner = ?1
             ORDER BY date IS NULL, date ASC",
        )?;
        let rows = statement.query_map(params![owner.as_str()], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(event_from_row(row?)?);
        }
        Ok(events)
    }

    async fn insert_event(&self, record: NewEvent) -> Result<Event, ScheduleError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO events (owner, title, kind, category, date, start_time, end_time,
                                 all_day, sleep, summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.owner.as_str(),
                record.title,
                record.kind.map(EventKind::as_str),
                record.category,
                date_to_sql(record.date),
                time_to_sql(record.start_time),
                time_to_sql(record.end_time),
                record.all_day,
                record.sleep,
                record.summary,
            ],
        )?;
        let id = EventId(connection.last_insert_rowid().to_string());
        Ok(record.into_event(id))
    }

    async fn update_event(&self, event: &Event) -> Result<(), ScheduleError> {
        let connection = self.connect()?;
        let affected = connection.execute(
            "UPDATE events
             SET title = ?3, kind = ?4, category = ?5, date = ?6, start_time = ?7,
                 end_time = ?8, all_day = ?9, sleep = ?10, summary = ?11
             WHERE id = ?1 AND owner = ?2",
            params![
                event_id_to_sql(&event.id)?,
                event.owner.as_str(),
                event.title,
                event.kind.map(EventKind::as_str),
                event.category,
                date_to_sql(event.date),
                time_to_sql(event.start_time),
                time_to_sql(event.end_time),
                event.all_day,
                event.sleep,
                event.summary,
            ],
        )?;
        if affected == 0 {
            return Err(ScheduleError::NotFound(format!(
                "event '{}'",
                event.id.as_str()
            )));
        }
        Ok(())
    }

    async fn delete_event(&self, owner: &OwnerId, id: &EventId) -> Result<(), ScheduleError> {
        let connection = self.connect()?;
        let affected = connection.execute(
            "DELETE FROM events WHERE id = ?1 AND owner = ?2",
            params![event_id_to_sql(id)?, owner.as_str()],
        )?;
        if affected == 0 {
            return Err(ScheduleError::NotFound(format!("event '{}'", id.as_str())));
        }
        Ok(())
    }

    async fn list_day_off(&self, owner: &OwnerId) -> Result<Vec<DayOffMarker>, ScheduleError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT date, is_off FROM day_off WHERE owner = ?1 ORDER BY date ASC",
        )?;
        let rows = statement.query_map(params![owner.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
        })?;

        let mut markers = Vec::new();
        for row in rows {
            let (date, is_off) = row?;
            markers.push(DayOffMarker {
                owner: owner.clone(),
                date: parse_date(&date)?,
                is_off,
            });
        }
        Ok(markers)
    }

    async fn get_day_off(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
    ) -> Result<Option<DayOffMarker>, ScheduleError> {
        let connection = self.connect()?;
        let is_off: Option<bool> = connection
            .query_row(
                "SELECT is_off FROM day_off WHERE owner = ?1 AND date = ?2",
                params![owner.as_str(), date.format(DATE_FORMAT).to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(is_off.map(|is_off| DayOffMarker {
            owner: owner.clone(),
            date,
            is_off,
        }))
    }

    async fn upsert_day_off(&self, marker: &DayOffMarker) -> Result<(), ScheduleError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO day_off (owner, date, is_off)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(owner, date) DO UPDATE SET is_off = excluded.is_off",
            params![
                marker.owner.as_str(),
                marker.date.format(DATE_FORMAT).to_string(),
                marker.is_off,
            ],
        )?;
        Ok(())
    }
}
