//! Lock record definitions
//!
//! Layout of a document in the locks collection:
//!
//! ```text
//! {
//!   _id:     <lock name>            string
//!   state:   0 | 1 | 2              int (UNLOCKED, LOCK_PREP, LOCKED)
//!   ts:      <lock session id>      ObjectId
//!   process: <owning process id>    string
//!   who:     <acquiring entity>     string
//!   when:    <acquisition time>     date
//!   why:     <reason>               string
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};

use super::{bson_integer, bson_type_name};
use crate::error::{LockError, Result};

/// Fencing token minted on every successful acquisition or takeover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockSessionId(ObjectId);

impl LockSessionId {
    /// Mint a fresh, process-unique token
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn from_object_id(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for LockSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for LockSessionId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<LockSessionId> for Bson {
    fn from(id: LockSessionId) -> Self {
        Bson::ObjectId(id.0)
    }
}

impl FromStr for LockSessionId {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|e| LockError::FailedToParse(format!("invalid lock session id '{}': {}", s, e)))
    }
}

impl fmt::Display for LockSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Lock state codes as stored on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LockState {
    Unlocked = 0,

    /// Intermediate state written by older lock managers; parsed, never written
    LockPrep = 1,

    Locked = 2,
}

impl LockState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(LockState::Unlocked),
            1 => Some(LockState::LockPrep),
            2 => Some(LockState::Locked),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<LockState> for Bson {
    fn from(state: LockState) -> Self {
        Bson::Int32(state.code())
    }
}

/// A single lock record
#[derive(Debug, Clone, PartialEq)]
pub struct LockRecord {
    /// Name of the protected resource
    pub name: String,

    pub state: LockState,

    /// Fencing token of the current (or last) holder
    pub lock_session_id: Option<LockSessionId>,

    /// Process instance that owns the lock
    pub process: Option<String>,

    /// Thread / connection identity of the acquirer
    pub who: Option<String>,

    pub when: Option<DateTime<Utc>>,

    /// Free-text reason, for diagnostics
    pub why: Option<String>,
}

impl LockRecord {
    // =========================================================================
    // Wire Field Names
    // =========================================================================
    pub const NAME: &'static str = "_id";
    pub const STATE: &'static str = "state";
    pub const LOCK_SESSION_ID: &'static str = "ts";
    pub const PROCESS: &'static str = "process";
    pub const WHO: &'static str = "who";
    pub const WHEN: &'static str = "when";
    pub const WHY: &'static str = "why";

    /// Fields written by a successful grab or overtake
    ///
    /// Used as the `$set` payload of the conditional update; the name is not
    /// included because it is either matched by the query or upserted from it.
    pub fn lock_details(
        lock_session_id: LockSessionId,
        who: &str,
        process: &str,
        when: DateTime<Utc>,
        why: &str,
    ) -> Document {
        doc! {
            Self::LOCK_SESSION_ID: lock_session_id,
            Self::STATE: LockState::Locked,
            Self::WHO: who,
            Self::PROCESS: process,
            Self::WHEN: bson::DateTime::from_chrono(when),
            Self::WHY: why,
        }
    }

    /// Whether the record is held by someone
    pub fn is_locked(&self) -> bool {
        self.state != LockState::Unlocked
    }

    /// Decode and validate a lock record
    pub fn from_document(doc: &Document) -> Result<Self> {
        let name = required_str(doc, Self::NAME)?;
        if name.is_empty() {
            return Err(LockError::FailedToParse(format!(
                "lock '{}' field cannot be empty",
                Self::NAME
            )));
        }

        let state_value = doc.get(Self::STATE).ok_or_else(|| missing(Self::STATE))?;
        let state = bson_integer(state_value)
            .and_then(LockState::from_code)
            .ok_or_else(|| {
                LockError::FailedToParse(format!(
                    "invalid lock '{}' value: {}",
                    Self::STATE,
                    state_value
                ))
            })?;

        let lock_session_id = match doc.get(Self::LOCK_SESSION_ID) {
            None | Some(Bson::Null) => None,
            Some(Bson::ObjectId(oid)) => Some(LockSessionId(*oid)),
            Some(other) => return Err(wrong_type(Self::LOCK_SESSION_ID, "objectId", other)),
        };

        let when = match doc.get(Self::WHEN) {
            None | Some(Bson::Null) => None,
            Some(Bson::DateTime(dt)) => Some(dt.to_chrono()),
            Some(other) => return Err(wrong_type(Self::WHEN, "date", other)),
        };

        let record = Self {
            name: name.to_string(),
            state,
            lock_session_id,
            process: optional_str(doc, Self::PROCESS)?,
            who: optional_str(doc, Self::WHO)?,
            when,
            why: optional_str(doc, Self::WHY)?,
        };

        record.validate()?;
        Ok(record)
    }

    /// A held lock must say who holds it and with which token
    fn validate(&self) -> Result<()> {
        if !self.is_locked() {
            return Ok(());
        }

        if self.lock_session_id.is_none() {
            return Err(missing(Self::LOCK_SESSION_ID));
        }
        if self.process.is_none() {
            return Err(missing(Self::PROCESS));
        }
        if self.who.is_none() {
            return Err(missing(Self::WHO));
        }
        if self.why.is_none() {
            return Err(missing(Self::WHY));
        }

        Ok(())
    }

    /// Encode as a stored document
    pub fn to_document(&self) -> Document {
        let mut doc = doc! {
            Self::NAME: self.name.as_str(),
            Self::STATE: self.state,
        };
        if let Some(id) = self.lock_session_id {
            doc.insert(Self::LOCK_SESSION_ID, id);
        }
        if let Some(process) = &self.process {
            doc.insert(Self::PROCESS, process.as_str());
        }
        if let Some(who) = &self.who {
            doc.insert(Self::WHO, who.as_str());
        }
        if let Some(when) = self.when {
            doc.insert(Self::WHEN, bson::DateTime::from_chrono(when));
        }
        if let Some(why) = &self.why {
            doc.insert(Self::WHY, why.as_str());
        }
        doc
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

fn missing(field: &str) -> LockError {
    LockError::FailedToParse(format!("missing lock '{}' field", field))
}

fn wrong_type(field: &str, expected: &str, found: &Bson) -> LockError {
    LockError::FailedToParse(format!(
        "lock '{}' field must be {}, found {}",
        field,
        expected,
        bson_type_name(found)
    ))
}

fn required_str<'a>(doc: &'a Document, field: &str) -> Result<&'a str> {
    match doc.get(field) {
        Some(Bson::String(s)) => Ok(s.as_str()),
        Some(other) => Err(wrong_type(field, "string", other)),
        None => Err(missing(field)),
    }
}

fn optional_str(doc: &Document, field: &str) -> Result<Option<String>> {
    match doc.get(field) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(field, "string", other)),
    }
}
