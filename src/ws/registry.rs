use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::models::{ConnectionId, Member, SessionId};

/// Result of a join request.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Roster of the joined session after the call.
    pub roster: Vec<Member>,
    /// The joiner's member record.
    pub member: Member,
    /// False when the connection was already a member of this session.
    pub inserted: bool,
    /// Set when the connection had to leave another session first.
    pub previous: Option<Departure>,
}

/// A member removed from a session.
#[derive(Debug, Clone)]
pub struct Departure {
    pub session_id: SessionId,
    pub member: Member,
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<SessionId, HashMap<ConnectionId, Member>>,
    memberships: HashMap<ConnectionId, SessionId>,
}

impl RegistryState {
    fn snapshot(&self, session_id: &str) -> Vec<Member> {
        let mut roster: Vec<Member> = self
            .sessions
            .get(session_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default();
        roster.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        roster
    }

    fn remove(&mut self, connection_id: &str) -> Option<Departure> {
        let session_id = self.memberships.remove(connection_id)?;
        let members = self.sessions.get_mut(&session_id)?;
        let member = members.remove(connection_id)?;
        if members.is_empty() {
            self.sessions.remove(&session_id);
            info!("Session {} emptied and removed", session_id);
        }
        Some(Departure { session_id, member })
    }
}

/// Thread-safe registry of session rosters.
///
/// All mutations go through one mutex, so joins and leaves never interleave.
/// Readers get owned snapshots and can iterate them without holding the lock.
#[derive(Default)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection to a session. Re-joining the same session is a no-op.
    pub fn join(&self, session_id: &str, connection_id: &str, display_name: &str) -> JoinOutcome {
        let mut state = self.lock();

        if state.memberships.get(connection_id).map(String::as_str) == Some(session_id) {
            let member = state
                .sessions
                .get(session_id)
                .and_then(|members| members.get(connection_id))
                .cloned();
            if let Some(member) = member {
                debug!("Connection {} already joined session {}", connection_id, session_id);
                return JoinOutcome {
                    roster: state.snapshot(session_id),
                    member,
                    inserted: false,
                    previous: None,
                };
            }
        }

        let previous = state.remove(connection_id);

        let member = Member::new(connection_id, display_name);
        state
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(connection_id.to_string(), member.clone());
        state
            .memberships
            .insert(connection_id.to_string(), session_id.to_string());

        info!("Member {} ({}) joined session {}", connection_id, display_name, session_id);
        JoinOutcome {
            roster: state.snapshot(session_id),
            member,
            inserted: true,
            previous,
        }
    }

    /// Remove a connection from its session, if any.
    pub fn leave(&self, connection_id: &str) -> Option<Departure> {
        let departure = self.lock().remove(connection_id);
        if let Some(departure) = &departure {
            info!("Member {} left session {}", connection_id, departure.session_id);
        }
        departure
    }

    /// Snapshot of a session's roster; empty for unknown sessions.
    pub fn roster(&self, session_id: &str) -> Vec<Member> {
        self.lock().snapshot(session_id)
    }

    pub fn session_of(&self, connection_id: &str) -> Option<SessionId> {
        self.lock().memberships.get(connection_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().sessions.contains_key(session_id)
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn member_count(&self) -> usize {
        self.lock().memberships.len()
    }
}
