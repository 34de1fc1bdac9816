//! Host targeting types

use std::fmt;
use std::str::FromStr;

use crate::error::{LockError, Result};

/// Which replica set member a command may be sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPreference {
    /// Only the current primary; every lock operation uses this
    PrimaryOnly,
    PrimaryPreferred,
    SecondaryOnly,
    SecondaryPreferred,
    Nearest,
}

/// A `host:port` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAndPort {
    host: String,
    port: u16,
}

impl HostAndPort {
    pub const DEFAULT_PORT: u16 = 27017;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for HostAndPort {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    LockError::FailedToParse(format!("invalid port in '{}': {}", s, e))
                })?;
                (host, port)
            }
            None => (s, Self::DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(LockError::FailedToParse(format!(
                "empty host name in '{}'",
                s
            )));
        }

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
