use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    ClientEvent, ConnectionId, JoinMessage, Member, ServerEvent, SessionId, TrackedField,
};

/// A participant's local copy of the shared workspace.
///
/// Incoming changes and syncs overwrite unconditionally, so the last one to
/// arrive wins. When another participant joins, the replica answers with one
/// sync request per field it holds.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceReplica {
    connection_id: Option<ConnectionId>,
    session_id: Option<SessionId>,
    roster: Vec<Member>,
    fields: BTreeMap<TrackedField, String>,
}

impl WorkspaceReplica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn roster(&self) -> &[Member] {
        &self.roster
    }

    pub fn get(&self, field: TrackedField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Build a join request and remember the session for later edits.
    pub fn join(&mut self, session_id: &str, display_name: &str) -> ClientEvent {
        self.session_id = Some(session_id.to_string());
        ClientEvent::Join(JoinMessage {
            session_id: Some(session_id.to_string()),
            display_name: Some(display_name.to_string()),
        })
    }

    /// Apply a local edit and return the change request to send.
    pub fn edit(&mut self, field: TrackedField, payload: impl Into<String>) -> ClientEvent {
        let payload = payload.into();
        self.fields.insert(field, payload.clone());
        ClientEvent::change(field, self.session_id.clone(), payload)
    }

    /// Apply a server event and return the requests it triggers.
    pub fn apply(&mut self, event: &ServerEvent) -> Vec<ClientEvent> {
        match event {
            ServerEvent::Connected(msg) => {
                self.connection_id = Some(msg.connection_id.clone());
                Vec::new()
            }
            ServerEvent::Joined(joined) => {
                self.roster = joined.roster.clone();
                if self.connection_id.as_deref() == Some(joined.connection_id.as_str()) {
                    return Vec::new();
                }
                debug!("Hydrating new member {}", joined.connection_id);
                self.fields
                    .iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(field, value)| {
                        ClientEvent::sync(*field, joined.connection_id.clone(), value.clone())
                    })
                    .collect()
            }
            ServerEvent::Disconnected(msg) => {
                self.roster.retain(|m| m.connection_id != msg.connection_id);
                Vec::new()
            }
            event => {
                if let Some((field, update)) = event.field_update() {
                    self.fields.insert(field, update.payload.clone());
                }
                Vec::new()
            }
        }
    }
}
