//! Lock catalog backed by a replica set config server

use std::sync::Arc;

use bson::{doc, Document};
use chrono::{DateTime, Utc};

use super::LockCatalog;
use crate::config::{CatalogConfig, Namespace};
use crate::error::{codes, LockError, Result};
use crate::network::{
    ReadPreference, RemoteCommandRequest, RemoteCommandRunner, RemoteCommandTargeter,
};
use crate::protocol::{self, FindAndModifyRequest, WriteConcern};
use crate::types::{LockPing, LockRecord, LockSessionId, LockState, ServerInfo};

/// Every lock operation must observe the primary's view
const READ_PREF: ReadPreference = ReadPreference::PrimaryOnly;

/// Lock catalog that issues atomic conditional updates against the primary
///
/// Holds only immutable configuration and the gateway handles, so it can be
/// shared freely across threads.
pub struct ReplSetLockCatalog {
    targeter: Arc<dyn RemoteCommandTargeter>,
    runner: Arc<dyn RemoteCommandRunner>,

    /// Majority + journal, bounded by the configured timeout
    write_concern: WriteConcern,

    locks_ns: Namespace,
    lock_pings_ns: Namespace,
    admin_db: String,
}

impl ReplSetLockCatalog {
    pub fn new(
        targeter: Arc<dyn RemoteCommandTargeter>,
        runner: Arc<dyn RemoteCommandRunner>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            targeter,
            runner,
            write_concern: WriteConcern::majority_journaled(config.write_concern_timeout),
            locks_ns: config.locks_namespace,
            lock_pings_ns: config.lock_pings_namespace,
            admin_db: config.admin_db,
        }
    }

    /// Convenience constructor for gateways implementing both traits
    pub fn with_gateway<G>(gateway: Arc<G>, config: CatalogConfig) -> Self
    where
        G: RemoteCommandTargeter + RemoteCommandRunner + 'static,
    {
        let targeter: Arc<dyn RemoteCommandTargeter> = gateway.clone();
        let runner: Arc<dyn RemoteCommandRunner> = gateway;
        Self::new(targeter, runner, config)
    }

    pub fn write_concern(&self) -> &WriteConcern {
        &self.write_concern
    }

    /// Target the primary, send `cmd_obj` to `db_name`, return the raw reply
    fn run(&self, db_name: &str, cmd_obj: Document) -> Result<Document> {
        let target = self.targeter.find_host(READ_PREF)?;
        tracing::trace!("Sending {} to {}/{}", cmd_obj, target, db_name);

        let request = RemoteCommandRequest::new(target, db_name, cmd_obj);
        let response = self.runner.run_command(&request)?;
        tracing::trace!(
            "Reply from {} after {:?}: {}",
            request.target,
            response.elapsed,
            response.data
        );

        Ok(response.data)
    }

    /// Run a findAndModify and decode its `value`
    fn find_and_modify(&self, request: &FindAndModifyRequest) -> Result<Option<Document>> {
        let data = self.run(request.namespace().db(), request.to_document())?;
        let result = protocol::extract_find_and_modify_result(&data);

        if let Err(LockError::WriteConcernFailed(msg)) = &result {
            tracing::warn!(
                "Write concern not satisfied on {} for query {}: {}",
                request.namespace(),
                request.query(),
                msg
            );
        }

        result
    }

    fn update_request(&self, ns: &Namespace, query: Document, set: Document) -> FindAndModifyRequest {
        let mut request = FindAndModifyRequest::make_update(ns.clone(), query, doc! { "$set": set });
        request.set_write_concern(self.write_concern.clone());
        request
    }
}

/// Map a post-update document to a lock record; empty means not acquired
fn parse_lock_result(new_doc: Option<Document>) -> Result<Option<LockRecord>> {
    match new_doc {
        Some(doc) if !doc.is_empty() => LockRecord::from_document(&doc).map(Some),
        _ => Ok(None),
    }
}

impl LockCatalog for ReplSetLockCatalog {
    fn ping(&self, process_id: &str, ping: DateTime<Utc>) -> Result<()> {
        let mut request = self.update_request(
            &self.lock_pings_ns,
            LockPing::query_for(process_id),
            doc! { LockPing::PING: bson::DateTime::from_chrono(ping) },
        );
        request.set_upsert(true);

        self.find_and_modify(&request)?;
        tracing::debug!("Pinged as process {} at {}", process_id, ping);
        Ok(())
    }

    fn grab_lock(
        &self,
        lock_id: &str,
        lock_session_id: LockSessionId,
        who: &str,
        process_id: &str,
        time: DateTime<Utc>,
        why: &str,
    ) -> Result<Option<LockRecord>> {
        let mut request = self.update_request(
            &self.locks_ns,
            doc! {
                LockRecord::NAME: lock_id,
                LockRecord::STATE: LockState::Unlocked,
            },
            LockRecord::lock_details(lock_session_id, who, process_id, time, why),
        );
        request.set_upsert(true).set_should_return_new(true);

        // A held lock makes the upsert collide with the existing `_id`.
        let new_doc = match self.find_and_modify(&request) {
            Err(e) if e.is_command_code(codes::DUPLICATE_KEY) => None,
            other => other?,
        };

        let record = parse_lock_result(new_doc)?;
        match &record {
            Some(_) => tracing::debug!("Grabbed lock {} with session {}", lock_id, lock_session_id),
            None => tracing::debug!("Lock {} is held by someone else", lock_id),
        }
        Ok(record)
    }

    fn overtake_lock(
        &self,
        lock_id: &str,
        lock_session_id: LockSessionId,
        current_holder: LockSessionId,
        who: &str,
        process_id: &str,
        time: DateTime<Utc>,
        why: &str,
    ) -> Result<Option<LockRecord>> {
        let query = doc! {
            "$or": [
                { LockRecord::NAME: lock_id, LockRecord::STATE: LockState::Unlocked },
                { LockRecord::NAME: lock_id, LockRecord::LOCK_SESSION_ID: current_holder },
            ]
        };

        let mut request = self.update_request(
            &self.locks_ns,
            query,
            LockRecord::lock_details(lock_session_id, who, process_id, time, why),
        );
        request.set_should_return_new(true);

        let record = parse_lock_result(self.find_and_modify(&request)?)?;
        match &record {
            Some(_) => tracing::debug!(
                "Overtook lock {} from session {} with session {}",
                lock_id,
                current_holder,
                lock_session_id
            ),
            None => tracing::debug!(
                "Lock {} is no longer held by session {}; not overtaken",
                lock_id,
                current_holder
            ),
        }
        Ok(record)
    }

    fn unlock(&self, lock_session_id: LockSessionId) -> Result<()> {
        let request = self.update_request(
            &self.locks_ns,
            doc! { LockRecord::LOCK_SESSION_ID: lock_session_id },
            doc! { LockRecord::STATE: LockState::Unlocked },
        );

        let previous = self.find_and_modify(&request)?;
        if previous.is_none() {
            tracing::debug!("Unlock of session {} matched nothing", lock_session_id);
        } else {
            tracing::debug!("Unlocked session {}", lock_session_id);
        }
        Ok(())
    }

    fn get_server_info(&self) -> Result<ServerInfo> {
        let data = self.run(&self.admin_db, protocol::server_status_command())?;
        let info = protocol::extract_server_info(&data)?;
        tracing::debug!(
            "Server time {} under election {}",
            info.server_time,
            info.election_id
        );
        Ok(info)
    }

    fn get_ping(&self, _process_id: &str) -> Result<LockPing> {
        unimplemented!("get_ping is not yet implemented")
    }

    fn get_lock_by_ts(&self, _lock_session_id: LockSessionId) -> Result<LockRecord> {
        unimplemented!("get_lock_by_ts is not yet implemented")
    }
}
