//! Client-facing wire protocol. Offer/answer/candidate payloads are carried
//! as raw JSON values and forwarded without inspection.

use parley_common::{PeerId, SessionError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client sends to the relay.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "create-session")]
    CreateSession,

    #[serde(rename = "join-session")]
    JoinSession { code: String },

    #[serde(rename = "leave-session")]
    LeaveSession,

    /// Local media is up; let the other member know.
    #[serde(rename = "ready")]
    Ready,

    #[serde(rename = "offer")]
    Offer { payload: Value, to: PeerId },

    #[serde(rename = "answer")]
    Answer { payload: Value, to: PeerId },

    #[serde(rename = "candidate")]
    Candidate { payload: Value, to: PeerId },

    #[serde(rename = "chat")]
    Chat { text: String, code: String },
}

/// Messages the relay sends to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "session-created")]
    SessionCreated { code: String },

    #[serde(rename = "session-joined")]
    SessionJoined { code: String },

    #[serde(rename = "session-error")]
    SessionError { reason: SessionError },

    #[serde(rename = "session-ready")]
    SessionReady { code: String },

    /// Sent only to the first joiner once the session is paired.
    #[serde(rename = "start-negotiation")]
    StartNegotiation { target: PeerId },

    #[serde(rename = "peer-ready")]
    PeerReady { from: PeerId },

    #[serde(rename = "offer")]
    Offer { payload: Value, from: PeerId },

    #[serde(rename = "answer")]
    Answer { payload: Value, from: PeerId },

    #[serde(rename = "candidate")]
    Candidate { payload: Value, from: PeerId },

    #[serde(rename = "chat")]
    Chat { text: String, from: PeerId },

    #[serde(rename = "peer-departed")]
    PeerDeparted { id: PeerId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_create_session() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"create-session"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::CreateSession));
    }

    #[test]
    fn parses_join_session_with_code() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join-session","code":"ABC234"}"#).unwrap();
        match msg {
            ClientMessage::JoinSession { code } => assert_eq!(code, "ABC234"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_offer_with_opaque_payload() {
        let to = PeerId::new();
        let raw = json!({
            "type": "offer",
            "payload": {"sdp": "v=0\r\no=- 42 2 IN IP4 127.0.0.1", "type": "offer"},
            "to": to.clone(),
        });
        let msg: ClientMessage = serde_json::from_value(raw).unwrap();
        match msg {
            ClientMessage::Offer { payload, to: dest } => {
                assert_eq!(dest, to);
                assert_eq!(payload["type"], "offer");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_chat_with_claimed_code() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"chat","text":"hi","code":"QWERTY"}"#).unwrap();
        match msg {
            ClientMessage::Chat { text, code } => {
                assert_eq!(text, "hi");
                assert_eq!(code, "QWERTY");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let res: Result<ClientMessage, _> = serde_json::from_str(r#"{"type":"shutdown"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn session_error_wire_shape() {
        let msg = ServerMessage::SessionError {
            reason: SessionError::NotFound,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, json!({"type": "session-error", "reason": "not-found"}));
    }

    #[test]
    fn start_negotiation_wire_shape() {
        let target = PeerId::new();
        let msg = ServerMessage::StartNegotiation {
            target: target.clone(),
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "start-negotiation");
        assert_eq!(v["target"], target.as_str());
    }

    #[test]
    fn peer_departed_wire_shape() {
        let id = PeerId::new();
        let v = serde_json::to_value(&ServerMessage::PeerDeparted { id: id.clone() }).unwrap();
        assert_eq!(v, json!({"type": "peer-departed", "id": id.as_str()}));
    }
}
