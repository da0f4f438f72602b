use crate::peer::error::SendResult;
use crate::peer::types::CorrelationToken;
use async_trait::async_trait;

/// Protocol session of one monitored peer.
///
/// Construction, authentication and room membership happen before the engine
/// sees the session.
#[async_trait]
pub trait ProbeSession: Send + Sync {
    /// Server name the peer is known by in the feed
    fn server_name(&self) -> &str;

    /// Send one probe message into `room` and return the event id the
    /// homeserver assigned to it.
    async fn send_probe(&self, room: &str) -> SendResult<CorrelationToken>;
}
