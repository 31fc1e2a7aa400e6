use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a collaboration session.
pub type SessionId = String;

/// Unique identifier assigned to every WebSocket connection.
pub type ConnectionId = String;

/// A connection's participation record within a session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(connection_id: impl Into<ConnectionId>, display_name: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            display_name: display_name.into(),
            joined_at: Utc::now(),
        }
    }
}

/// The shared workspace values that are synchronized independently.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackedField {
    Code,
    Input,
    Output,
    Language,
}

impl TrackedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::Code => "code",
            TrackedField::Input => "input",
            TrackedField::Output => "output",
            TrackedField::Language => "language",
        }
    }
}

impl std::fmt::Display for TrackedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
