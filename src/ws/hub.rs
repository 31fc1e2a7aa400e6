use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    ConnectedMessage, ConnectionId, DisconnectedMessage, JoinedMessage, Member, ServerEvent,
    SessionId, TrackedField,
};
use crate::ws::registry::{Departure, SessionRegistry};
use crate::ws::router::{BroadcastRouter, Outbound};

/// Coordinates joins, departures, edits and the late-join sync relay.
///
/// The hub keeps no copy of the workspace. A newcomer is hydrated by the
/// existing members, who answer the `joined` broadcast by sending their own
/// values straight to the newcomer through [`SessionHub::sync`].
pub struct SessionHub {
    registry: Arc<SessionRegistry>,
    router: BroadcastRouter,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let router = BroadcastRouter::new(registry.clone());
        Self { registry, router }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn router(&self) -> &BroadcastRouter {
        &self.router
    }

    /// Register a new connection and greet it with its id.
    pub fn connect(&self) -> (ConnectionId, Outbound) {
        let connection_id = Uuid::new_v4().to_string();
        let outbound = self.router.register(&connection_id);
        self.router.unicast(
            &connection_id,
            ServerEvent::Connected(ConnectedMessage {
                connection_id: connection_id.clone(),
            }),
        );
        info!("Connection {} registered", connection_id);
        (connection_id, outbound)
    }

    /// Join a session and announce the newcomer to everyone in it, the
    /// newcomer included. A repeated join only answers the requester.
    pub fn join(&self, connection_id: &str, session_id: &str, display_name: &str) -> Vec<Member> {
        let outcome = self.registry.join(session_id, connection_id, display_name);

        if let Some(previous) = outcome.previous {
            self.announce_departure(previous);
        }

        let joined = ServerEvent::Joined(JoinedMessage {
            roster: outcome.roster.clone(),
            connection_id: connection_id.to_string(),
            display_name: outcome.member.display_name.clone(),
        });
        if outcome.inserted {
            self.router.broadcast(session_id, joined, None);
        } else {
            self.router.unicast(connection_id, joined);
        }
        outcome.roster
    }

    /// Remove a connection from its session and notify the remaining members.
    pub fn leave(&self, connection_id: &str) -> Option<SessionId> {
        let departure = self.registry.leave(connection_id)?;
        let session_id = departure.session_id.clone();
        self.announce_departure(departure);
        Some(session_id)
    }

    /// Final teardown of a connection. Safe to call more than once.
    pub fn disconnect(&self, connection_id: &str) {
        self.leave(connection_id);
        if self.router.unregister(connection_id) {
            info!("Connection {} closed", connection_id);
        }
    }

    /// Broadcast an edit to the sender's session, excluding the sender.
    pub fn change(&self, connection_id: &str, field: TrackedField, payload: String) -> usize {
        let Some(session_id) = self.registry.session_of(connection_id) else {
            debug!("Ignoring {} change from {}: not in a session", field, connection_id);
            return 0;
        };
        let event = ServerEvent::change(field, payload, connection_id.to_string());
        self.router.broadcast(&session_id, event, Some(connection_id))
    }

    /// Relay a peer's current value of a field to a newcomer in the same session.
    pub fn sync(&self, connection_id: &str, field: TrackedField, target: &str, payload: String) -> bool {
        if target == connection_id {
            return false;
        }
        let sender_session = self.registry.session_of(connection_id);
        if sender_session.is_none() || sender_session != self.registry.session_of(target) {
            debug!("Dropping {} sync from {} to {}: no shared session", field, connection_id, target);
            return false;
        }
        let event = ServerEvent::sync(field, payload, connection_id.to_string());
        self.router.unicast(target, event)
    }

    fn announce_departure(&self, departure: Departure) {
        let event = ServerEvent::Disconnected(DisconnectedMessage {
            connection_id: departure.member.connection_id.clone(),
            display_name: departure.member.display_name,
        });
        self.router.broadcast(
            &departure.session_id,
            event,
            Some(&departure.member.connection_id),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut Outbound) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push((*event).clone());
        }
        events
    }

    fn connect(hub: &SessionHub) -> (ConnectionId, Outbound) {
        let (id, mut rx) = hub.connect();
        let greeting = drain(&mut rx);
        assert!(matches!(greeting.as_slice(), [ServerEvent::Connected(m)] if m.connection_id == id));
        (id, rx)
    }

    #[test]
    fn joined_reaches_every_member_including_joiner() {
        let hub = SessionHub::new();
        let (a, mut rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);

        hub.join(&a, "room1", "alice");
        drain(&mut rx_a);
        let roster = hub.join(&b, "room1", "bob");
        assert_eq!(roster.len(), 2);

        for rx in [&mut rx_a, &mut rx_b] {
            match drain(rx).as_slice() {
                [ServerEvent::Joined(joined)] => {
                    assert_eq!(joined.connection_id, b);
                    assert_eq!(joined.display_name, "bob");
                    assert_eq!(joined.roster.len(), 2);
                }
                other => panic!("unexpected events {other:?}"),
            }
        }
    }

    #[test]
    fn repeated_join_does_not_rebroadcast() {
        let hub = SessionHub::new();
        let (a, mut rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        hub.join(&a, "room1", "alice");
        hub.join(&b, "room1", "bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        let roster = hub.join(&b, "room1", "bob");
        assert_eq!(roster.len(), 2);
        assert!(drain(&mut rx_a).is_empty());
        match drain(&mut rx_b).as_slice() {
            [ServerEvent::Joined(joined)] => assert_eq!(joined.roster.len(), 2),
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn change_is_not_echoed_to_its_origin() {
        let hub = SessionHub::new();
        let (a, mut rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        hub.join(&a, "room1", "alice");
        hub.join(&b, "room1", "bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        assert_eq!(hub.change(&a, TrackedField::Code, "print(2)".into()), 1);

        assert!(drain(&mut rx_a).is_empty());
        match drain(&mut rx_b).as_slice() {
            [ServerEvent::CodeChange(update)] => {
                assert_eq!(update.payload, "print(2)");
                assert_eq!(update.origin_connection_id, a);
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn change_before_join_goes_nowhere() {
        let hub = SessionHub::new();
        let (a, _rx_a) = connect(&hub);
        assert_eq!(hub.change(&a, TrackedField::Code, "x".into()), 0);
    }

    #[test]
    fn sync_is_delivered_only_within_the_session() {
        let hub = SessionHub::new();
        let (a, _rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        let (c, mut rx_c) = connect(&hub);
        hub.join(&a, "room1", "alice");
        hub.join(&b, "room1", "bob");
        hub.join(&c, "room2", "carol");
        drain(&mut rx_b);
        drain(&mut rx_c);

        assert!(hub.sync(&a, TrackedField::Language, &b, "Python".into()));
        assert!(!hub.sync(&a, TrackedField::Language, &c, "Python".into()));
        assert!(!hub.sync(&a, TrackedField::Language, &a, "Python".into()));

        match drain(&mut rx_b).as_slice() {
            [ServerEvent::SyncLanguage(update)] => assert_eq!(update.payload, "Python"),
            other => panic!("unexpected events {other:?}"),
        }
        assert!(drain(&mut rx_c).is_empty());
    }

    #[test]
    fn disconnect_notifies_remaining_members_once() {
        let hub = SessionHub::new();
        let (a, _rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        hub.join(&a, "room1", "alice");
        hub.join(&b, "room1", "bob");
        drain(&mut rx_b);

        hub.disconnect(&a);
        hub.disconnect(&a);

        let events = drain(&mut rx_b);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerEvent::Disconnected(msg) => {
                assert_eq!(msg.connection_id, a);
                assert_eq!(msg.display_name, "alice");
            }
            other => panic!("unexpected event {other:?}"),
        }
        let roster = hub.registry().roster("room1");
        assert!(roster.iter().all(|m| m.connection_id != a));
        assert_eq!(hub.router().connection_count(), 1);
    }

    #[test]
    fn switching_sessions_notifies_the_old_room() {
        let hub = SessionHub::new();
        let (a, _rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        hub.join(&a, "room1", "alice");
        hub.join(&b, "room1", "bob");
        drain(&mut rx_b);

        hub.join(&a, "room2", "alice");

        assert!(matches!(drain(&mut rx_b).as_slice(), [ServerEvent::Disconnected(m)] if m.connection_id == a));
        assert_eq!(hub.registry().session_of(&a).as_deref(), Some("room2"));
    }

    #[test]
    fn last_departure_removes_session() {
        let hub = SessionHub::new();
        let (a, _rx_a) = connect(&hub);
        hub.join(&a, "room1", "alice");

        assert_eq!(hub.leave(&a).as_deref(), Some("room1"));
        assert!(!hub.registry().contains("room1"));
        assert!(hub.leave(&a).is_none());
    }
}
