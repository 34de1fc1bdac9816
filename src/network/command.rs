//! Remote command execution
//!
//! The transport, connection pooling and replica set monitoring live outside
//! this crate. The lock catalog only sees these two traits.

use std::time::Duration;

use bson::Document;

use super::{HostAndPort, ReadPreference};
use crate::error::Result;

/// A command addressed to one host and database
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCommandRequest {
    pub target: HostAndPort,
    pub db_name: String,
    pub cmd_obj: Document,
}

impl RemoteCommandRequest {
    pub fn new(target: HostAndPort, db_name: impl Into<String>, cmd_obj: Document) -> Self {
        Self {
            target,
            db_name: db_name.into(),
            cmd_obj,
        }
    }
}

/// Raw reply of a remote command
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCommandResponse {
    /// Reply document; may itself report `ok: 0`
    pub data: Document,

    /// Round trip time
    pub elapsed: Duration,
}

impl RemoteCommandResponse {
    pub fn new(data: Document, elapsed: Duration) -> Self {
        Self { data, elapsed }
    }
}

/// Picks the host a command should be sent to
///
/// Implementations report `LockError::HostUnavailable` when no member
/// satisfies the preference.
pub trait RemoteCommandTargeter: Send + Sync {
    fn find_host(&self, read_pref: ReadPreference) -> Result<HostAndPort>;
}

/// Sends a command and waits for its reply
///
/// Transport failures are `LockError::Execution`. A reply with `ok: 0` is
/// still `Ok(response)`; interpreting it is the caller's job.
pub trait RemoteCommandRunner: Send + Sync {
    fn run_command(&self, request: &RemoteCommandRequest) -> Result<RemoteCommandResponse>;
}
