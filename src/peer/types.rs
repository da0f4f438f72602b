use crate::peer::session::ProbeSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PeerRole {
    Local,
    Remote,
}

/// Measurement direction, derived from the originating peer's role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn of(role: PeerRole) -> Self {
        match role {
            PeerRole::Local => Direction::Outgoing,
            PeerRole::Remote => Direction::Incoming,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque event id assigned to a sent probe
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self(event_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct Peer {
    pub server_name: String,
    pub role: PeerRole,
    pub session: Arc<dyn ProbeSession>,
}

impl Peer {
    pub fn new(role: PeerRole, session: Arc<dyn ProbeSession>) -> Self {
        Self {
            server_name: session.server_name().to_string(),
            role,
            session,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::of(self.role)
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("server_name", &self.server_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Static set of monitored peers: one local plus any number of remotes
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    local: Peer,
    remotes: Vec<Peer>,
}

impl PeerRegistry {
    pub fn new(local: Arc<dyn ProbeSession>, remotes: Vec<Arc<dyn ProbeSession>>) -> Self {
        Self {
            local: Peer::new(PeerRole::Local, local),
            remotes: remotes
                .into_iter()
                .map(|session| Peer::new(PeerRole::Remote, session))
                .collect(),
        }
    }

    pub fn local(&self) -> &Peer {
        &self.local
    }

    pub fn remotes(&self) -> &[Peer] {
        &self.remotes
    }

    /// Local peer first, then remotes in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        std::iter::once(&self.local).chain(self.remotes.iter())
    }

    /// Number of peers, local included
    pub fn peer_count(&self) -> usize {
        1 + self.remotes.len()
    }

    /// Server names of every peer, local included
    pub fn server_names(&self) -> Vec<String> {
        self.iter().map(|p| p.server_name.clone()).collect()
    }
}

/// Server part of a Matrix user id (`@bot:example.org` -> `example.org`)
pub fn server_name_of(user_id: &str) -> Option<&str> {
    let rest = user_id.strip_prefix('@')?;
    let (_, server) = rest.split_once(':')?;
    if server.is_empty() {
        None
    } else {
        Some(server)
    }
}
