use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Primary,
    Secondary,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Primary, SourceKind::Secondary];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Primary => "primary",
            SourceKind::Secondary => "secondary",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A joke in display form, independent of the upstream payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedJoke {
    pub text: String,
    pub source_label: String,
    pub source_kind: SourceKind,
}

impl NormalizedJoke {
    pub fn new(
        source_kind: SourceKind,
        source_label: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_label: source_label.into(),
            source_kind,
        }
    }
}

/// Rendered as `{created_at_millis}-{sequence}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntryId(pub String);

impl HistoryEntryId {
    pub fn new(created_at: DateTime<Utc>, sequence: u64) -> Self {
        Self(format!("{}-{sequence}", created_at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub created_at: DateTime<Utc>,
    pub source_kind: SourceKind,
    pub text: String,
    pub source_label: String,
}

impl HistoryEntry {
    pub fn from_joke(
        id: HistoryEntryId,
        created_at: DateTime<Utc>,
        joke: NormalizedJoke,
    ) -> Self {
        Self {
            id,
            created_at,
            source_kind: joke.source_kind,
            text: joke.text,
            source_label: joke.source_label,
        }
    }
}
