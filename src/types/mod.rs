//! Types Module
//!
//! Documents stored in (or reported by) the config store.
//!
//! ## Collections
//! - `config.locks`:     one [`LockRecord`] per lock name
//! - `config.lockpings`: one [`LockPing`] per process
//!
//! [`ServerInfo`] is never stored; it is decoded from a status reply.

mod locks;
mod lockpings;
mod server_info;

pub use locks::{LockRecord, LockSessionId, LockState};
pub use lockpings::LockPing;
pub use server_info::ServerInfo;

use bson::Bson;

/// Read a BSON number of any width as an i64
///
/// Doubles are accepted only when they hold an integral value.
pub(crate) fn bson_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

/// Human-readable BSON type name for error messages
pub(crate) fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Document(_) => "object",
        Bson::Array(_) => "array",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Timestamp(_) => "timestamp",
        _ => "other",
    }
}
