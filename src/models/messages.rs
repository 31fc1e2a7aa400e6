use serde::{Deserialize, Serialize};
use crate::models::{ConnectionId, Member, SessionId, TrackedField};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinMessage {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub payload: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    pub target_connection_id: ConnectionId,
    pub payload: String,
}

/// Messages received from a client over the WebSocket
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join")]
    Join(JoinMessage),
    #[serde(rename = "leave")]
    Leave,
    #[serde(rename = "code-change")]
    CodeChange(ChangeMessage),
    #[serde(rename = "input-change")]
    InputChange(ChangeMessage),
    #[serde(rename = "output-change")]
    OutputChange(ChangeMessage),
    #[serde(rename = "language-change", alias = "language_change")]
    LanguageChange(ChangeMessage),
    #[serde(rename = "sync-code")]
    SyncCode(SyncMessage),
    #[serde(rename = "sync-input")]
    SyncInput(SyncMessage),
    #[serde(rename = "sync-output")]
    SyncOutput(SyncMessage),
    #[serde(rename = "sync-language")]
    SyncLanguage(SyncMessage),
}

impl ClientEvent {
    pub fn change(field: TrackedField, session_id: Option<SessionId>, payload: String) -> Self {
        let msg = ChangeMessage { session_id, payload };
        match field {
            TrackedField::Code => ClientEvent::CodeChange(msg),
            TrackedField::Input => ClientEvent::InputChange(msg),
            TrackedField::Output => ClientEvent::OutputChange(msg),
            TrackedField::Language => ClientEvent::LanguageChange(msg),
        }
    }

    pub fn sync(field: TrackedField, target_connection_id: ConnectionId, payload: String) -> Self {
        let msg = SyncMessage { target_connection_id, payload };
        match field {
            TrackedField::Code => ClientEvent::SyncCode(msg),
            TrackedField::Input => ClientEvent::SyncInput(msg),
            TrackedField::Output => ClientEvent::SyncOutput(msg),
            TrackedField::Language => ClientEvent::SyncLanguage(msg),
        }
    }

    /// Split a change request into its field and message
    pub fn as_change(&self) -> Option<(TrackedField, &ChangeMessage)> {
        match self {
            ClientEvent::CodeChange(m) => Some((TrackedField::Code, m)),
            ClientEvent::InputChange(m) => Some((TrackedField::Input, m)),
            ClientEvent::OutputChange(m) => Some((TrackedField::Output, m)),
            ClientEvent::LanguageChange(m) => Some((TrackedField::Language, m)),
            _ => None,
        }
    }

    /// Split a sync request into its field and message
    pub fn as_sync(&self) -> Option<(TrackedField, &SyncMessage)> {
        match self {
            ClientEvent::SyncCode(m) => Some((TrackedField::Code, m)),
            ClientEvent::SyncInput(m) => Some((TrackedField::Input, m)),
            ClientEvent::SyncOutput(m) => Some((TrackedField::Output, m)),
            ClientEvent::SyncLanguage(m) => Some((TrackedField::Language, m)),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: ConnectionId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinedMessage {
    pub roster: Vec<Member>,
    pub connection_id: ConnectionId,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectedMessage {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdateMessage {
    pub payload: String,
    pub origin_connection_id: ConnectionId,
}

/// Messages sent to a client over the WebSocket
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connected")]
    Connected(ConnectedMessage),
    #[serde(rename = "joined")]
    Joined(JoinedMessage),
    #[serde(rename = "disconnected")]
    Disconnected(DisconnectedMessage),
    #[serde(rename = "code-change")]
    CodeChange(FieldUpdateMessage),
    #[serde(rename = "input-change")]
    InputChange(FieldUpdateMessage),
    #[serde(rename = "output-change")]
    OutputChange(FieldUpdateMessage),
    #[serde(rename = "language-change")]
    LanguageChange(FieldUpdateMessage),
    #[serde(rename = "sync-code")]
    SyncCode(FieldUpdateMessage),
    #[serde(rename = "sync-input")]
    SyncInput(FieldUpdateMessage),
    #[serde(rename = "sync-output")]
    SyncOutput(FieldUpdateMessage),
    #[serde(rename = "sync-language")]
    SyncLanguage(FieldUpdateMessage),
}

impl ServerEvent {
    pub fn change(field: TrackedField, payload: String, origin_connection_id: ConnectionId) -> Self {
        let msg = FieldUpdateMessage { payload, origin_connection_id };
        match field {
            TrackedField::Code => ServerEvent::CodeChange(msg),
            TrackedField::Input => ServerEvent::InputChange(msg),
            TrackedField::Output => ServerEvent::OutputChange(msg),
            TrackedField::Language => ServerEvent::LanguageChange(msg),
        }
    }

    pub fn sync(field: TrackedField, payload: String, origin_connection_id: ConnectionId) -> Self {
        let msg = FieldUpdateMessage { payload, origin_connection_id };
        match field {
            TrackedField::Code => ServerEvent::SyncCode(msg),
            TrackedField::Input => ServerEvent::SyncInput(msg),
            TrackedField::Output => ServerEvent::SyncOutput(msg),
            TrackedField::Language => ServerEvent::SyncLanguage(msg),
        }
    }

    /// The field and value carried by a change or sync event, if any.
    /// Both kinds are applied the same way by receivers.
    pub fn field_update(&self) -> Option<(TrackedField, &FieldUpdateMessage)> {
        match self {
            ServerEvent::CodeChange(m) | ServerEvent::SyncCode(m) => Some((TrackedField::Code, m)),
            ServerEvent::InputChange(m) | ServerEvent::SyncInput(m) => Some((TrackedField::Input, m)),
            ServerEvent::OutputChange(m) | ServerEvent::SyncOutput(m) => Some((TrackedField::Output, m)),
            ServerEvent::LanguageChange(m) | ServerEvent::SyncLanguage(m) => {
                Some((TrackedField::Language, m))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_message() {
        let raw = r#"{"event":"join","data":{"sessionId":"room1","displayName":"alice"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join(JoinMessage {
                session_id: Some("room1".into()),
                display_name: Some("alice".into()),
            })
        );
    }

    #[test]
    fn join_without_session_id_still_parses() {
        let raw = r#"{"event":"join","data":{"displayName":"alice"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        match event {
            ClientEvent::Join(join) => assert!(join.session_id.is_none()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn parses_leave_without_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"leave"}"#).unwrap();
        assert_eq!(event, ClientEvent::Leave);
    }

    #[test]
    fn accepts_underscore_language_change() {
        let raw = r#"{"event":"language_change","data":{"sessionId":"room1","payload":"Java"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        let (field, msg) = event.as_change().unwrap();
        assert_eq!(field, TrackedField::Language);
        assert_eq!(msg.payload, "Java");
    }

    #[test]
    fn unknown_event_is_rejected() {
        let raw = r#"{"event":"self-destruct","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn sync_request_maps_to_field() {
        let event = ClientEvent::sync(TrackedField::Output, "c2".into(), "42".into());
        let (field, msg) = event.as_sync().unwrap();
        assert_eq!(field, TrackedField::Output);
        assert_eq!(msg.target_connection_id, "c2");
        assert!(event.as_change().is_none());
    }

    #[test]
    fn server_event_wire_shape() {
        let event = ServerEvent::sync(TrackedField::Code, "print(1)".into(), "c1".into());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "sync-code");
        assert_eq!(json["data"]["payload"], "print(1)");
        assert_eq!(json["data"]["originConnectionId"], "c1");

        let change = ServerEvent::change(TrackedField::Language, "Python".into(), "c1".into());
        let (field, _) = change.field_update().unwrap();
        assert_eq!(field, TrackedField::Language);
        assert!(matches!(change, ServerEvent::LanguageChange(_)));
    }
}
