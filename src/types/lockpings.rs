//! Liveness record definitions

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LockError, Result};

/// Heartbeat entry for one process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockPing {
    #[serde(rename = "_id")]
    pub process: String,

    /// Last time the process reported itself alive
    pub ping: bson::DateTime,
}

impl LockPing {
    pub const PROCESS: &'static str = "_id";
    pub const PING: &'static str = "ping";

    pub fn new(process: impl Into<String>, ping: DateTime<Utc>) -> Self {
        Self {
            process: process.into(),
            ping: bson::DateTime::from_chrono(ping),
        }
    }

    pub fn ping_time(&self) -> DateTime<Utc> {
        self.ping.to_chrono()
    }

    /// Query matching the record of `process`
    pub fn query_for(process: &str) -> Document {
        doc! { Self::PROCESS: process }
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        bson::from_document(doc.clone()).map_err(|e| LockError::FailedToParse(e.to_string()))
    }

    pub fn to_document(&self) -> Result<Document> {
        bson::to_document(self).map_err(|e| LockError::FailedToParse(e.to_string()))
    }
}
