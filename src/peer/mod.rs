//! Monitored peers
//!
//! A peer is one federated server that sends probes into the shared
//! monitoring room. Each peer is backed by a protocol session supplied by the
//! session layer; the engine only talks to it through [`ProbeSession`].

pub mod error;
pub mod session;
pub mod types;

pub use error::{SendError, SendResult};
pub use session::ProbeSession;
pub use types::{server_name_of, CorrelationToken, Direction, Peer, PeerRegistry, PeerRole};
