//! Minimal Matrix client-server session
//!
//! Only what the exporter needs: log in, join the ping room, send probes
//! and pongs, and long-poll `/sync` so inbound probes from other exporters
//! get answered.

pub mod client;
pub mod echo;
pub mod error;
pub mod types;

pub use client::MatrixSession;
pub use echo::{EchoReply, EchoResponder};
pub use error::{SessionError, SessionResult};
pub use types::InboundMessage;
