use tracing::{debug, info, warn};

use crate::models::{ClientEvent, ConnectionId, SessionId};
use crate::ws::hub::SessionHub;

const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Where a connection stands in its session lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Membership {
    Unjoined,
    Joined { session_id: SessionId },
    Leaving,
    Removed,
}

/// What the gateway should do with the connection after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Per-connection context owned by the gateway's reader task.
#[derive(Clone, Debug)]
pub struct ConnCtx {
    pub connection_id: ConnectionId,
    pub membership: Membership,
}

impl ConnCtx {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            membership: Membership::Unjoined,
        }
    }

    fn session_id(&self) -> Option<&str> {
        match &self.membership {
            Membership::Joined { session_id } => Some(session_id),
            _ => None,
        }
    }

    /// Apply one inbound event.
    pub fn handle(&mut self, hub: &SessionHub, event: ClientEvent) -> Flow {
        if matches!(self.membership, Membership::Leaving | Membership::Removed) {
            debug!("Ignoring event from departed connection {}", self.connection_id);
            return Flow::Close;
        }

        match event {
            ClientEvent::Join(join) => {
                let Some(session_id) = join.session_id.filter(|s| !s.trim().is_empty()) else {
                    warn!("Ignoring join without session id from {}", self.connection_id);
                    return Flow::Continue;
                };
                let display_name = join
                    .display_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
                hub.join(&self.connection_id, &session_id, &display_name);
                self.membership = Membership::Joined { session_id };
                Flow::Continue
            }
            ClientEvent::Leave => {
                if self.session_id().is_some() {
                    self.membership = Membership::Leaving;
                    hub.leave(&self.connection_id);
                }
                self.membership = Membership::Removed;
                info!("Connection {} left its session", self.connection_id);
                Flow::Close
            }
            event => {
                let Some(session_id) = self.session_id() else {
                    debug!("Ignoring event from {} before join", self.connection_id);
                    return Flow::Continue;
                };
                if let Some((field, change)) = event.as_change() {
                    if change.session_id.as_deref().is_some_and(|s| s != session_id) {
                        warn!("Ignoring {} change from {} for foreign session", field, self.connection_id);
                        return Flow::Continue;
                    }
                    hub.change(&self.connection_id, field, change.payload.clone());
                } else if let Some((field, sync)) = event.as_sync() {
                    hub.sync(&self.connection_id, field, &sync.target_connection_id, sync.payload.clone());
                }
                Flow::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JoinMessage, ServerEvent, TrackedField};
    use crate::ws::router::Outbound;

    fn join(session_id: Option<&str>, name: Option<&str>) -> ClientEvent {
        ClientEvent::Join(JoinMessage {
            session_id: session_id.map(String::from),
            display_name: name.map(String::from),
        })
    }

    fn drain(rx: &mut Outbound) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push((*event).clone());
        }
        events
    }

    fn connected(hub: &SessionHub) -> (ConnCtx, Outbound) {
        let (id, mut rx) = hub.connect();
        drain(&mut rx);
        (ConnCtx::new(id), rx)
    }

    #[test]
    fn join_without_session_id_is_ignored() {
        let hub = SessionHub::new();
        let (mut ctx, mut rx) = connected(&hub);

        assert_eq!(ctx.handle(&hub, join(None, Some("alice"))), Flow::Continue);
        assert_eq!(ctx.handle(&hub, join(Some("  "), Some("alice"))), Flow::Continue);

        assert_eq!(ctx.membership, Membership::Unjoined);
        assert_eq!(hub.registry().session_count(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn join_moves_to_joined_with_default_name() {
        let hub = SessionHub::new();
        let (mut ctx, mut rx) = connected(&hub);

        ctx.handle(&hub, join(Some("room1"), None));

        assert_eq!(ctx.membership, Membership::Joined { session_id: "room1".into() });
        match drain(&mut rx).as_slice() {
            [ServerEvent::Joined(joined)] => assert_eq!(joined.display_name, DEFAULT_DISPLAY_NAME),
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn edits_before_join_are_ignored() {
        let hub = SessionHub::new();
        let (mut a, mut rx_a) = connected(&hub);
        let (mut b, _rx_b) = connected(&hub);
        b.handle(&hub, join(Some("room1"), Some("bob")));

        let edit = ClientEvent::change(TrackedField::Code, Some("room1".into()), "x".into());
        assert_eq!(a.handle(&hub, edit), Flow::Continue);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(hub.registry().roster("room1").len(), 1);
    }

    #[test]
    fn change_for_another_session_is_ignored() {
        let hub = SessionHub::new();
        let (mut a, _rx_a) = connected(&hub);
        let (mut b, mut rx_b) = connected(&hub);
        a.handle(&hub, join(Some("room1"), Some("alice")));
        b.handle(&hub, join(Some("room1"), Some("bob")));
        drain(&mut rx_b);

        a.handle(&hub, ClientEvent::change(TrackedField::Code, Some("room9".into()), "x".into()));
        assert!(drain(&mut rx_b).is_empty());

        a.handle(&hub, ClientEvent::change(TrackedField::Code, None, "y".into()));
        assert!(matches!(drain(&mut rx_b).as_slice(), [ServerEvent::CodeChange(m)] if m.payload == "y"));
    }

    #[test]
    fn leave_removes_member_and_closes() {
        let hub = SessionHub::new();
        let (mut a, _rx_a) = connected(&hub);
        let (mut b, mut rx_b) = connected(&hub);
        a.handle(&hub, join(Some("room1"), Some("alice")));
        b.handle(&hub, join(Some("room1"), Some("bob")));
        drain(&mut rx_b);

        assert_eq!(a.handle(&hub, ClientEvent::Leave), Flow::Close);
        assert_eq!(a.membership, Membership::Removed);
        assert!(matches!(drain(&mut rx_b).as_slice(), [ServerEvent::Disconnected(m)] if m.connection_id == a.connection_id));

        // Removed is terminal.
        assert_eq!(a.handle(&hub, join(Some("room1"), Some("alice"))), Flow::Close);
        assert_eq!(hub.registry().roster("room1").len(), 1);

        // The transport close that follows must not announce a second departure.
        hub.disconnect(&a.connection_id);
        assert!(drain(&mut rx_b).is_empty());
    }
}
