use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MESSAGE_EVENT: &str = "m.room.message";
pub const PONG_RELATION: &str = "xyz.maubot.pong";
pub const PONG_BODY: &str = "Pong!";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub identifier: UserIdentifier<'a>,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserIdentifier<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub access_token: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinResponse {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    pub event_id: String,
}

/// Standard error body of the client-server API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixErrorBody {
    #[serde(default)]
    pub errcode: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextContent {
    pub msgtype: String,
    pub body: String,
}

impl TextContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            msgtype: "m.text".to_string(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    pub rel_type: String,
    pub event_id: String,
}

/// Reply to a probe, pointing back at the probe's event id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PongContent {
    pub msgtype: String,
    pub body: String,
    #[serde(rename = "m.relates_to")]
    pub relates_to: Relation,
}

impl PongContent {
    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            msgtype: "m.notice".to_string(),
            body: PONG_BODY.to_string(),
            relates_to: Relation {
                rel_type: PONG_RELATION.to_string(),
                event_id: event_id.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub rooms: SyncRooms,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRooms {
    #[serde(default)]
    pub join: HashMap<String, JoinedRoom>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinedRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub events: Vec<RoomEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// A text message seen in a joined room
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub room_id: String,
    pub event_id: String,
    pub sender: String,
    pub body: String,
    /// Milliseconds since the Unix epoch
    pub origin_server_ts: i64,
}

impl SyncResponse {
    /// Text messages in `room_id` carried by this sync batch
    pub fn messages(&self, room_id: &str) -> Vec<InboundMessage> {
        let Some(room) = self.rooms.join.get(room_id) else {
            return Vec::new();
        };

        room.timeline
            .events
            .iter()
            .filter(|event| event.kind == MESSAGE_EVENT)
            .filter_map(|event| {
                let body = event.content.get("body")?.as_str()?;
                Some(InboundMessage {
                    room_id: room_id.to_string(),
                    event_id: event.event_id.clone(),
                    sender: event.sender.clone(),
                    body: body.to_string(),
                    origin_server_ts: event.origin_server_ts,
                })
            })
            .collect()
    }
}
