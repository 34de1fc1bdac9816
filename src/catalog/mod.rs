//! Catalog Module
//!
//! The public lock protocol surface.
//!
//! ## Operations
//! - `ping`            - upsert this process's liveness record
//! - `grab_lock`       - take a lock that is unlocked or has never existed
//! - `overtake_lock`   - take a lock from a holder presumed dead
//! - `unlock`          - release by fencing token (idempotent)
//! - `get_server_info` - primary clock + election epoch
//!
//! Every call is one round trip. The catalog keeps no state between calls;
//! all serialization of competing callers happens inside the store's atomic
//! conditional update.

mod replset;

pub use replset::ReplSetLockCatalog;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{LockPing, LockRecord, LockSessionId, ServerInfo};

/// Lock and liveness records kept in a config store
///
/// `grab_lock` and `overtake_lock` return `Ok(None)` when the conditional
/// update matched nothing, meaning the lock is held by someone else. That is
/// a normal outcome, never an error.
pub trait LockCatalog: Send + Sync {
    /// Record that `process_id` was alive at `ping`
    fn ping(&self, process_id: &str, ping: DateTime<Utc>) -> Result<()>;

    /// Acquire `lock_id` if it is unlocked or does not exist yet
    fn grab_lock(
        &self,
        lock_id: &str,
        lock_session_id: LockSessionId,
        who: &str,
        process_id: &str,
        time: DateTime<Utc>,
        why: &str,
    ) -> Result<Option<LockRecord>>;

    /// Acquire `lock_id` if it is unlocked or still held by `current_holder`
    ///
    /// Deciding that `current_holder` is dead is the caller's job; this only
    /// enforces the fencing check.
    #[allow(clippy::too_many_arguments)]
    fn overtake_lock(
        &self,
        lock_id: &str,
        lock_session_id: LockSessionId,
        current_holder: LockSessionId,
        who: &str,
        process_id: &str,
        time: DateTime<Utc>,
        why: &str,
    ) -> Result<Option<LockRecord>>;

    /// Release whichever lock is held with `lock_session_id`
    ///
    /// Succeeds when nothing holds that token any more.
    fn unlock(&self, lock_session_id: LockSessionId) -> Result<()>;

    fn get_server_info(&self) -> Result<ServerInfo>;

    /// Not yet implemented; panics
    fn get_ping(&self, process_id: &str) -> Result<LockPing>;

    /// Not yet implemented; panics
    fn get_lock_by_ts(&self, lock_session_id: LockSessionId) -> Result<LockRecord>;
}
