//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Per-session record tracked by the registry and mirrored to viewers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub client: Value,
    pub status: String,
    pub is_newest: bool,
}

/// Commands a monitor viewer may send.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerCommand {
    #[serde(rename = "watch_session")]
    WatchSession { session_id: String },
    #[serde(rename = "stop_watching")]
    StopWatching { session_id: String },
}

/// Outgoing events. `Custom` carries a caller-chosen `type` value, so this
/// implements [`Serialize`] by hand rather than deriving a tagged enum
/// (derive would fix the discriminant per-variant, not per-instance).
#[derive(Clone, Debug)]
pub enum OutgoingEvent {
    SessionStarted { session: SessionRecord },
    SessionEnded { session: SessionRecord },
    ActiveSessions { sessions: Vec<SessionRecord> },
    WatchResponse { session_id: String, status: &'static str },
    /// Arbitrary session activity (`client_input`, `server_message`, ...).
    Custom {
        event_type: String,
        session_id: String,
        data: Value,
    },
}

impl OutgoingEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for OutgoingEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutgoingEvent::SessionStarted { session } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "session_started")?;
                map.serialize_entry("session", session)?;
                map.end()
            }
            OutgoingEvent::SessionEnded { session } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "session_ended")?;
                map.serialize_entry("session", session)?;
                map.end()
            }
            OutgoingEvent::ActiveSessions { sessions } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "active_sessions")?;
                map.serialize_entry("sessions", sessions)?;
                map.end()
            }
            OutgoingEvent::WatchResponse { session_id, status } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "watch_response")?;
                map.serialize_entry("session_id", session_id)?;
                map.serialize_entry("status", status)?;
                map.end()
            }
            OutgoingEvent::Custom { event_type, session_id, data } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", event_type)?;
                map.serialize_entry("session_id", session_id)?;
                map.serialize_entry("data", data)?;
                map.end()
            }
        }
    }
}
