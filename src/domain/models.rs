use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Opaque event identifier, assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId(value.to_string())
    }
}

/// Identifies the account whose events and day-off markers are being read
/// or written. Every store query is scoped by this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        OwnerId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Game,
    Scenario,
    RealLife,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Scenario => "scenario",
            Self::RealLife => "real_life",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "game" => Some(Self::Game),
            "scenario" => Some(Self::Scenario),
            "real_life" => Some(Self::RealLife),
            _ => None,
        }
    }

    /// Category tags that are valid for this kind. The sets mirror the
    /// selector options in the calendar edit form.
    pub fn valid_categories(self) -> &'static [&'static str] {
        match self {
            Self::Game => &[
                "🤪", "🚀", "🍎", "🐺", "🔍", "🪿", "🫖", "🚙", "🛸", "⛄", "👻", "💳",
            ],
            Self::Scenario => &["📕", "📗", "📘", "📙"],
            Self::RealLife => &["🌏"],
        }
    }
}

/// A scheduled (or to-be-scheduled) calendar entry.
///
/// `start_time`/`end_time` are canonical: the stored hour is always 0-23.
/// An event whose stored hour is 0-5 is read as a continuation of the
/// previous evening (extended hours 24-29) for display and sorting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub owner: OwnerId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub sleep: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Event {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(self.id.as_str(), "event.id")?;
        validate_non_empty(self.owner.as_str(), "event.owner")?;
        validate_non_empty(&self.title, "event.title")?;
        validate_category(self.kind, self.category.as_deref())?;
        Ok(())
    }
}

/// A normalized event ready for insertion. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewEvent {
    pub owner: OwnerId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub sleep: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl NewEvent {
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            owner: self.owner,
            title: self.title,
            kind: self.kind,
            category: self.category,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            all_day: self.all_day,
            sleep: self.sleep,
            summary: self.summary,
        }
    }
}

/// Per-date highlight flag, independent of events. Upserted on toggle,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayOffMarker {
    pub owner: OwnerId,
    pub date: NaiveDate,
    pub is_off: bool,
}

/// User-entered event fields before normalization. Times use the extended
/// clock ("H:MM"/"HH:MM", hour 0-29), the date is "YYYY-MM-DD".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub sleep: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "event.title")?;
        validate_category(self.kind, self.category.as_deref())?;
        if let Some(date) = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            validate_date(date, "event.date")?;
        }
        Ok(())
    }
}

pub(crate) fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{field_name} must be YYYY-MM-DD"))?;
    Ok(())
}

fn validate_category(kind: Option<EventKind>, category: Option<&str>) -> Result<(), String> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    match (kind, category) {
        (_, None) => Ok(()),
        (None, Some(category)) => Err(format!(
            "event.category '{category}' requires an event.kind"
        )),
        (Some(kind), Some(category)) => {
            if kind.valid_categories().contains(&category) {
                Ok(())
            } else {
                Err(format!(
                    "event.category '{category}' is not valid for kind '{}'",
                    kind.as_str()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            id: EventId::from("evt-1"),
            owner: OwnerId::from("owner-1"),
            title: "Werewolf night".to_string(),
            kind: Some(EventKind::Game),
            category: Some("🐺".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            start_time: NaiveTime::from_hms_opt(21, 0, 0),
            end_time: NaiveTime::from_hms_opt(23, 30, 0),
            all_day: false,
            sleep: false,
            summary: Some("weekly session".to_string()),
        }
    }

    #[test]
    fn valid_event_passes_validation() {
        assert_eq!(sample_event().validate(), Ok(()));
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut event = sample_event();
        event.title = "   ".to_string();
        assert!(event.validate().is_err());
    }

    #[test]
    fn category_must_match_kind() {
        let mut event = sample_event();
        event.category = Some("📕".to_string());
        assert!(event.validate().is_err());

        event.kind = Some(EventKind::Scenario);
        assert_eq!(event.validate(), Ok(()));
    }

    #[test]
    fn category_without_kind_is_rejected() {
        let mut event = sample_event();
        event.kind = None;
        assert!(event.validate().is_err());

        event.category = None;
        assert_eq!(event.validate(), Ok(()));
    }

    #[test]
    fn draft_accepts_blank_optional_fields() {
        let draft = EventDraft {
            title: "Unscheduled".to_string(),
            ..EventDraft::default()
        };
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn draft_rejects_malformed_date() {
        let draft = EventDraft {
            title: "Bad date".to_string(),
            date: Some("05/01/2024".to_string()),
            ..EventDraft::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = sample_event();
        let roundtrip: Event =
            serde_json::from_str(&serde_json::to_string(&event).expect("serialize event"))
                .expect("deserialize event");
        assert_eq!(roundtrip, event);
    }
}
