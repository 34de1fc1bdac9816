//! Configuration for the lock catalog
//!
//! Fixed, process-wide settings injected once at construction time.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LockError, Result};

/// Fully qualified collection name (`db.collection`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    db: String,
    coll: String,
}

impl Namespace {
    /// Build a namespace from its two parts
    pub fn new(db: impl Into<String>, coll: impl Into<String>) -> Result<Self> {
        let db = db.into();
        let coll = coll.into();
        if db.is_empty() || coll.is_empty() {
            return Err(LockError::Config(format!(
                "invalid namespace '{}.{}': database and collection must be non-empty",
                db, coll
            )));
        }
        if db.contains('.') {
            return Err(LockError::Config(format!(
                "invalid namespace database name '{}'",
                db
            )));
        }
        Ok(Self { db, coll })
    }

    /// Database part
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Collection part
    pub fn coll(&self) -> &str {
        &self.coll
    }
}

impl FromStr for Namespace {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((db, coll)) => Namespace::new(db, coll),
            None => Err(LockError::Config(format!(
                "invalid namespace '{}': expected <db>.<collection>",
                s
            ))),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.coll)
    }
}

/// Main configuration for a lock catalog client
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// How long the store may wait for majority + journal acknowledgement
    /// before reporting a write concern failure
    pub write_concern_timeout: Duration,

    // -------------------------------------------------------------------------
    // Collection Layout
    // -------------------------------------------------------------------------
    /// Lock records, keyed by lock name
    pub locks_namespace: Namespace,

    /// Liveness records, keyed by process id
    pub lock_pings_namespace: Namespace,

    /// Database that status queries run against
    pub admin_db: String,
}

impl CatalogConfig {
    pub const DEFAULT_LOCKS_NAMESPACE: &'static str = "config.locks";
    pub const DEFAULT_LOCK_PINGS_NAMESPACE: &'static str = "config.lockpings";
    pub const DEFAULT_ADMIN_DB: &'static str = "admin";
    pub const DEFAULT_WRITE_CONCERN_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create a new config builder
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            write_concern_timeout: Self::DEFAULT_WRITE_CONCERN_TIMEOUT,
            locks_namespace: Namespace {
                db: "config".to_string(),
                coll: "locks".to_string(),
            },
            lock_pings_namespace: Namespace {
                db: "config".to_string(),
                coll: "lockpings".to_string(),
            },
            admin_db: Self::DEFAULT_ADMIN_DB.to_string(),
        }
    }
}

/// Builder for CatalogConfig
///
/// Namespaces are kept as strings until `build()` so a bad value is
/// reported once, at construction, instead of on first use.
pub struct CatalogConfigBuilder {
    write_concern_timeout: Duration,
    locks_namespace: String,
    lock_pings_namespace: String,
    admin_db: String,
}

impl Default for CatalogConfigBuilder {
    fn default() -> Self {
        Self {
            write_concern_timeout: CatalogConfig::DEFAULT_WRITE_CONCERN_TIMEOUT,
            locks_namespace: CatalogConfig::DEFAULT_LOCKS_NAMESPACE.to_string(),
            lock_pings_namespace: CatalogConfig::DEFAULT_LOCK_PINGS_NAMESPACE.to_string(),
            admin_db: CatalogConfig::DEFAULT_ADMIN_DB.to_string(),
        }
    }
}

impl CatalogConfigBuilder {
    /// Set the write concern timeout
    pub fn write_concern_timeout(mut self, timeout: Duration) -> Self {
        self.write_concern_timeout = timeout;
        self
    }

    /// Set the write concern timeout (in milliseconds)
    pub fn write_concern_timeout_ms(mut self, ms: u64) -> Self {
        self.write_concern_timeout = Duration::from_millis(ms);
        self
    }

    /// Set the lock records namespace (`db.coll`)
    pub fn locks_namespace(mut self, ns: impl Into<String>) -> Self {
        self.locks_namespace = ns.into();
        self
    }

    /// Set the liveness records namespace (`db.coll`)
    pub fn lock_pings_namespace(mut self, ns: impl Into<String>) -> Self {
        self.lock_pings_namespace = ns.into();
        self
    }

    /// Set the database used for status queries
    pub fn admin_db(mut self, db: impl Into<String>) -> Self {
        self.admin_db = db.into();
        self
    }

    pub fn build(self) -> Result<CatalogConfig> {
        if self.admin_db.is_empty() {
            return Err(LockError::Config("admin database name is empty".to_string()));
        }

        Ok(CatalogConfig {
            write_concern_timeout: self.write_concern_timeout,
            locks_namespace: self.locks_namespace.parse()?,
            lock_pings_namespace: self.lock_pings_namespace.parse()?,
            admin_db: self.admin_db,
        })
    }
}
