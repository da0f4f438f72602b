use crate::matrix::types::{InboundMessage, PongContent};
use crate::probe::PROBE_BODY;

/// Pong to send in answer to a probe
#[derive(Debug, Clone, PartialEq)]
pub struct EchoReply {
    pub room_id: String,
    pub content: PongContent,
}

/// Answers probes posted by other peers. Stateless apart from identity and
/// start time.
#[derive(Debug, Clone)]
pub struct EchoResponder {
    room_id: String,
    own_user_id: String,
    started_at_ms: i64,
}

impl EchoResponder {
    pub fn new(room_id: impl Into<String>, own_user_id: impl Into<String>) -> Self {
        Self::started_at(room_id, own_user_id, chrono::Utc::now().timestamp_millis())
    }

    pub fn started_at(
        room_id: impl Into<String>,
        own_user_id: impl Into<String>,
        started_at_ms: i64,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            own_user_id: own_user_id.into(),
            started_at_ms,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Reply for `message`, if it is a fresh probe from someone else
    pub fn reply_to(&self, message: &InboundMessage) -> Option<EchoReply> {
        if message.room_id != self.room_id
            || message.sender == self.own_user_id
            || message.origin_server_ts < self.started_at_ms
            || message.body != PROBE_BODY
        {
            return None;
        }

        Some(EchoReply {
            room_id: message.room_id.clone(),
            content: PongContent::for_event(message.event_id.clone()),
        })
    }
}
