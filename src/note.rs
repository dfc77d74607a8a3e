//! Core data structures for the notepad application.
//!
//! A [`Note`] is the only persisted entity. Its JSON form uses camelCase keys
//! and RFC 3339 timestamps so the stored list stays readable by anything that
//! speaks the same layout.
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::now_millis;

/// Title given to a freshly created note.
pub const DEFAULT_TITLE: &str = "New Note";

/// Title stored when a note is saved with a blank title.
pub const UNTITLED: &str = "Untitled";

/// Last id handed out by [`generate_note_id`], in epoch milliseconds.
static LAST_ISSUED_ID: AtomicI64 = AtomicI64::new(0);

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Free text body
    #[serde(default)]
    pub content: String,
    /// Whether the note has been checked off. Older stored lists omit it.
    #[serde(default)]
    pub completed: bool,
    /// When the note was created
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a note with the given id and the default field values
    pub fn new(id: String) -> Self {
        let now = now_millis();
        Note {
            id,
            title: DEFAULT_TITLE.to_string(),
            content: String::new(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Re-stamps the modification time
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// Field-level changes applied by the repository on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub completed: Option<bool>,
}

impl NoteUpdate {
    /// Title and content change, as committed from a draft
    pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
        NoteUpdate {
            title: Some(title.into()),
            content: Some(content.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        NoteUpdate {
            completed: Some(completed),
            ..Default::default()
        }
    }

    /// Writes the present fields into `note` and re-stamps it.
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(completed) = self.completed {
            note.completed = completed;
        }
        note.touch();
    }
}

/// Returns `title` unless it is blank, in which case [`UNTITLED`].
pub fn normalize_title(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Generates a new note id from the current time in epoch milliseconds.
///
/// Ids are strictly increasing within the process, so two notes created in
/// the same millisecond still get distinct ids.
pub fn generate_note_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ISSUED_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ISSUED_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next.to_string(),
            Err(current) => last = current,
        }
    }
}

/// Serde adapter for note timestamps.
///
/// Writes RFC 3339 with millisecond precision and a `Z` suffix. Reads an
/// ISO 8601 string (an offset-less value is taken as UTC), a number of epoch
/// milliseconds, or `null`, which maps to the Unix epoch.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
        FractionalMillis(f64),
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawTimestamp>::deserialize(deserializer)? {
            None => Ok(DateTime::UNIX_EPOCH),
            Some(RawTimestamp::Text(text)) => parse_text(text.trim())
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", text))),
            Some(RawTimestamp::Millis(millis)) => from_millis(millis).ok_or_else(|| {
                D::Error::custom(format!("timestamp out of range: {}", millis))
            }),
            Some(RawTimestamp::FractionalMillis(millis)) => from_millis(millis.trunc() as i64)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", millis))),
        }
    }

    const NAIVE_FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    fn parse_text(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Some(naive) = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(millis).single()
    }
}
