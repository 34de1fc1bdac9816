//! Network Module
//!
//! The gateway the lock catalog talks through.
//!
//! ## Flow
//! - `RemoteCommandTargeter` selects a primary-capable host
//! - `RemoteCommandRunner` executes one command document on it
//! - The catalog decodes the reply with `crate::protocol`

mod command;
mod host;

pub use command::{
    RemoteCommandRequest, RemoteCommandResponse, RemoteCommandRunner, RemoteCommandTargeter,
};
pub use host::{HostAndPort, ReadPreference};
