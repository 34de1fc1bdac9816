//! Write concern definitions
//!
//! The durability requirement attached to every mutation, and the error
//! detail the store returns when that requirement was not met.

use std::time::Duration;

use bson::{doc, Bson, Document};

use crate::error::{LockError, Result};
use crate::types::{bson_integer, bson_type_name};

/// How many members must acknowledge a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAcknowledgement {
    Majority,
    Nodes(i32),
}

/// Durability requirement sent with each mutating command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConcern {
    pub w: WriteAcknowledgement,

    /// Wait for the on-disk journal before acknowledging
    pub journal: bool,

    /// Zero means wait forever
    pub timeout: Duration,
}

impl WriteConcern {
    /// Majority-acknowledged and journaled, bounded by `timeout`
    pub fn majority_journaled(timeout: Duration) -> Self {
        Self {
            w: WriteAcknowledgement::Majority,
            journal: true,
            timeout,
        }
    }

    pub fn to_document(&self) -> Document {
        let w = match &self.w {
            WriteAcknowledgement::Majority => Bson::String("majority".to_string()),
            WriteAcknowledgement::Nodes(n) => Bson::Int32(*n),
        };
        let wtimeout = i64::try_from(self.timeout.as_millis()).unwrap_or(i64::MAX);

        doc! {
            "w": w,
            "j": self.journal,
            "wtimeout": wtimeout,
        }
    }
}

/// Parsed `writeConcernError` sub-document
#[derive(Debug, Clone, PartialEq)]
pub struct WriteConcernErrorDetail {
    pub code: i32,
    pub message: Option<String>,
    pub info: Option<Document>,
}

impl WriteConcernErrorDetail {
    pub const CODE: &'static str = "code";
    pub const ERRMSG: &'static str = "errmsg";
    pub const ERRINFO: &'static str = "errInfo";

    /// Parse the sub-document; a malformed shape is `UnsupportedFormat`
    pub fn parse(doc: &Document) -> Result<Self> {
        let code = match doc.get(Self::CODE) {
            Some(value) => bson_integer(value)
                .and_then(|c| i32::try_from(c).ok())
                .ok_or_else(|| {
                    LockError::UnsupportedFormat(format!(
                        "write concern error '{}' must be an integer, found {}",
                        Self::CODE,
                        bson_type_name(value)
                    ))
                })?,
            None => {
                return Err(LockError::UnsupportedFormat(format!(
                    "write concern error is missing '{}'",
                    Self::CODE
                )))
            }
        };

        let message = match doc.get(Self::ERRMSG) {
            None => None,
            Some(Bson::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(LockError::UnsupportedFormat(format!(
                    "write concern error '{}' must be a string, found {}",
                    Self::ERRMSG,
                    bson_type_name(other)
                )))
            }
        };

        let info = match doc.get(Self::ERRINFO) {
            None => None,
            Some(Bson::Document(d)) => Some(d.clone()),
            Some(other) => {
                return Err(LockError::UnsupportedFormat(format!(
                    "write concern error '{}' must be an object, found {}",
                    Self::ERRINFO,
                    bson_type_name(other)
                )))
            }
        };

        Ok(Self {
            code,
            message,
            info,
        })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = doc! { Self::CODE: self.code };
        if let Some(message) = &self.message {
            doc.insert(Self::ERRMSG, message.as_str());
        }
        if let Some(info) = &self.info {
            doc.insert(Self::ERRINFO, info.clone());
        }
        doc
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}
