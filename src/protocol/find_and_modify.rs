//! Atomic conditional update request
//!
//! ## Command Shape
//! ```text
//! {
//!   findAndModify: <collection>,
//!   query:         <match predicate>,
//!   update:        <update spec>,
//!   upsert:        bool            (only if set)
//!   new:           bool            (only if set)
//!   writeConcern:  <write concern> (only if set)
//! }
//! ```
//!
//! The store applies the update to at most one matching document, and the
//! match + update pair is indivisible with respect to concurrent commands.

use bson::{doc, Document};

use super::WriteConcern;
use crate::config::Namespace;

/// Builder for a findAndModify update command
#[derive(Debug, Clone)]
pub struct FindAndModifyRequest {
    ns: Namespace,
    query: Document,
    update: Document,
    upsert: Option<bool>,
    should_return_new: Option<bool>,
    write_concern: Option<WriteConcern>,
}

impl FindAndModifyRequest {
    pub const COMMAND_NAME: &'static str = "findAndModify";
    pub const QUERY: &'static str = "query";
    pub const UPDATE: &'static str = "update";
    pub const UPSERT: &'static str = "upsert";
    pub const NEW: &'static str = "new";
    pub const WRITE_CONCERN: &'static str = "writeConcern";

    /// Create an update request against `ns`
    pub fn make_update(ns: Namespace, query: Document, update: Document) -> Self {
        Self {
            ns,
            query,
            update,
            upsert: None,
            should_return_new: None,
            write_concern: None,
        }
    }

    pub fn set_upsert(&mut self, upsert: bool) -> &mut Self {
        self.upsert = Some(upsert);
        self
    }

    /// Return the post-update document instead of the pre-image
    pub fn set_should_return_new(&mut self, should_return_new: bool) -> &mut Self {
        self.should_return_new = Some(should_return_new);
        self
    }

    pub fn set_write_concern(&mut self, write_concern: WriteConcern) -> &mut Self {
        self.write_concern = Some(write_concern);
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    pub fn query(&self) -> &Document {
        &self.query
    }

    /// Render as a command document
    pub fn to_document(&self) -> Document {
        let mut cmd = doc! {
            Self::COMMAND_NAME: self.ns.coll(),
            Self::QUERY: self.query.clone(),
            Self::UPDATE: self.update.clone(),
        };

        if let Some(upsert) = self.upsert {
            cmd.insert(Self::UPSERT, upsert);
        }
        if let Some(new) = self.should_return_new {
            cmd.insert(Self::NEW, new);
        }
        if let Some(wc) = &self.write_concern {
            cmd.insert(Self::WRITE_CONCERN, wc.to_document());
        }

        cmd
    }
}
