//! Store Module
//!
//! An in-memory config server used to exercise the lock catalog without a
//! real replica set.
//!
//! ## Guarantees
//! - Each command executes under one mutex, so a findAndModify's match and
//!   update are atomic with respect to every other command
//! - Upserts collide on `_id` exactly like a unique index would

mod matcher;
mod memory;

pub use memory::MemoryConfigServer;
