//! Server epoch snapshot

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

/// Clock and leadership epoch reported by the targeted primary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo {
    /// Authoritative wall clock of the responding host
    pub server_time: DateTime<Utc>,

    /// Changes every time the primary role changes hands
    pub election_id: ObjectId,
}

impl ServerInfo {
    pub fn new(server_time: DateTime<Utc>, election_id: ObjectId) -> Self {
        Self {
            server_time,
            election_id,
        }
    }

    /// Whether a fail-over happened between `earlier` and this snapshot
    pub fn has_failed_over_since(&self, earlier: &ServerInfo) -> bool {
        self.election_id != earlier.election_id
    }
}
