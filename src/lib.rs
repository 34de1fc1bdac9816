//! # distlock
//!
//! Client-side protocol for named distributed locks kept in a replicated,
//! strongly consistent config document store:
//! - Acquire, overtake and release locks with atomic conditional updates
//! - Fencing tokens minted per acquisition
//! - Process liveness heartbeats
//! - Election epoch reporting so callers can detect fail-over
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Caller                                │
//! │        (retry, lease renewal, abandonment policy)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  LockCatalog                                 │
//! │   ping / grab_lock / overtake_lock / unlock / server info    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │   Network   │
//!   │ (build and  │          │ (targeter + │
//!   │   decode)   │          │   runner)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Config store│
//!                           │  (primary)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod types;
pub mod protocol;
pub mod network;
pub mod catalog;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LockError, Result};
pub use config::CatalogConfig;
pub use catalog::{LockCatalog, ReplSetLockCatalog};
pub use types::{LockPing, LockRecord, LockSessionId, LockState, ServerInfo};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of distlock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
