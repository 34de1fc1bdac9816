//! In-memory config server
//!
//! A single-node stand-in for the replicated config store. It is always
//! primary, applies every findAndModify under one mutex, and lets tests
//! inject the failures a real replica set can produce.

use std::collections::HashMap;
use std::time::Instant;

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use parking_lot::Mutex;

use super::matcher::{apply_update, matches, upsert_seed, MatchError};
use crate::error::{codes, LockError, Result};
use crate::network::{
    HostAndPort, ReadPreference, RemoteCommandRequest, RemoteCommandResponse, RemoteCommandRunner,
    RemoteCommandTargeter,
};
use crate::protocol::{
    FindAndModifyRequest, WriteConcernErrorDetail, ELECTION_ID_FIELD, GLE_STATS_FIELD,
    LOCAL_TIME_FIELD, WRITE_CONCERN_ERROR_FIELD,
};

const COMMAND_NOT_FOUND: i32 = 59;

/// Mutable server state, guarded as a whole
struct ServerState {
    /// Documents per `db.coll`, in insertion order
    collections: HashMap<String, Vec<Document>>,

    election_id: ObjectId,

    /// When false, targeting and execution both fail
    reachable: bool,

    /// Reply `ok: 0` with this code/message to the next command
    fail_next: Option<(i32, String)>,

    /// Attach this write concern error to the next mutating command
    write_concern_error: Option<WriteConcernErrorDetail>,

    commands_executed: u64,
}

/// Single-node config server implementing both gateway traits
pub struct MemoryConfigServer {
    host: HostAndPort,
    state: Mutex<ServerState>,
}

impl MemoryConfigServer {
    pub fn new() -> Self {
        Self::with_host(HostAndPort::new("localhost", HostAndPort::DEFAULT_PORT))
    }

    pub fn with_host(host: HostAndPort) -> Self {
        Self {
            host,
            state: Mutex::new(ServerState {
                collections: HashMap::new(),
                election_id: ObjectId::new(),
                reachable: true,
                fail_next: None,
                write_concern_error: None,
                commands_executed: 0,
            }),
        }
    }

    // =========================================================================
    // Failure Injection
    // =========================================================================

    /// Simulate the whole replica set becoming unreachable (or coming back)
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Make the next command reply `ok: 0` without executing
    pub fn fail_next_command(&self, code: i32, message: impl Into<String>) {
        self.state.lock().fail_next = Some((code, message.into()));
    }

    /// Make the next mutating command apply but report a write concern error
    pub fn fail_next_write_concern(&self, code: i32, message: impl Into<String>) {
        self.state.lock().write_concern_error = Some(WriteConcernErrorDetail {
            code,
            message: Some(message.into()),
            info: None,
        });
    }

    /// Elect a new primary; returns the new election id
    pub fn step_down(&self) -> ObjectId {
        let mut state = self.state.lock();
        state.election_id = ObjectId::new();
        tracing::debug!("Config server stepped down, new election {}", state.election_id);
        state.election_id
    }

    // =========================================================================
    // Direct Access (bypasses the command path)
    // =========================================================================

    pub fn election_id(&self) -> ObjectId {
        self.state.lock().election_id
    }

    /// Seed a document, replacing any with the same `_id`
    pub fn insert(&self, ns: &str, doc: Document) {
        let mut state = self.state.lock();
        let coll = state.collections.entry(ns.to_string()).or_default();
        let id = doc.get("_id").cloned();
        coll.retain(|existing| id.is_none() || existing.get("_id") != id.as_ref());
        coll.push(doc);
    }

    pub fn find_one(&self, ns: &str, id: impl Into<Bson>) -> Option<Document> {
        let id = id.into();
        let state = self.state.lock();
        state
            .collections
            .get(ns)?
            .iter()
            .find(|doc| doc.get("_id") == Some(&id))
            .cloned()
    }

    pub fn count(&self, ns: &str) -> usize {
        self.state.lock().collections.get(ns).map_or(0, Vec::len)
    }

    pub fn commands_executed(&self) -> u64 {
        self.state.lock().commands_executed
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    fn execute(&self, db_name: &str, cmd: &Document) -> Document {
        let mut state = self.state.lock();
        state.commands_executed += 1;

        if let Some((code, message)) = state.fail_next.take() {
            return error_reply(code, &message);
        }

        match cmd.keys().next().map(String::as_str) {
            Some(FindAndModifyRequest::COMMAND_NAME) => {
                find_and_modify(&mut state, db_name, cmd).unwrap_or_else(|e| e)
            }
            Some("serverStatus") => doc! {
                "ok": 1.0,
                "host": self.host.to_string(),
                LOCAL_TIME_FIELD: bson::DateTime::now(),
                GLE_STATS_FIELD: { ELECTION_ID_FIELD: state.election_id },
            },
            Some(other) => error_reply(COMMAND_NOT_FOUND, &format!("no such command: '{}'", other)),
            None => error_reply(codes::FAILED_TO_PARSE, "empty command"),
        }
    }
}

impl Default for MemoryConfigServer {
    fn default() -> Self {
        Self::new()
    }
}

fn error_reply(code: i32, message: &str) -> Document {
    doc! { "ok": 0.0, "code": code, "errmsg": message }
}

fn bad_value(e: MatchError) -> Document {
    error_reply(codes::BAD_VALUE, &e.0)
}

/// Execute one findAndModify; `Err` carries an `ok: 0` reply
fn find_and_modify(
    state: &mut ServerState,
    db_name: &str,
    cmd: &Document,
) -> std::result::Result<Document, Document> {
    let coll_name = match cmd.get(FindAndModifyRequest::COMMAND_NAME) {
        Some(Bson::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(error_reply(codes::BAD_VALUE, "collection name must be a string")),
    };

    let query = match cmd.get(FindAndModifyRequest::QUERY) {
        None => Document::new(),
        Some(Bson::Document(q)) => q.clone(),
        Some(_) => return Err(error_reply(codes::FAILED_TO_PARSE, "query must be an object")),
    };
    let update = match cmd.get(FindAndModifyRequest::UPDATE) {
        Some(Bson::Document(u)) => u.clone(),
        _ => return Err(error_reply(codes::FAILED_TO_PARSE, "update must be an object")),
    };
    let upsert = cmd.get_bool(FindAndModifyRequest::UPSERT).unwrap_or(false);
    let return_new = cmd.get_bool(FindAndModifyRequest::NEW).unwrap_or(false);

    match cmd.get(FindAndModifyRequest::WRITE_CONCERN) {
        None | Some(Bson::Document(_)) => {}
        Some(_) => {
            return Err(error_reply(codes::FAILED_TO_PARSE, "writeConcern must be an object"))
        }
    }

    let ns = format!("{}.{}", db_name, coll_name);
    let coll = state.collections.entry(ns).or_default();

    let mut position = None;
    for (i, doc) in coll.iter().enumerate() {
        if matches(doc, &query).map_err(bad_value)? {
            position = Some(i);
            break;
        }
    }

    let (value, last_error) = match position {
        Some(i) => {
            let before = coll[i].clone();
            let mut after = before.clone();
            apply_update(&mut after, &update).map_err(bad_value)?;
            coll[i] = after.clone();

            let value = if return_new { after } else { before };
            (Bson::Document(value), doc! { "n": 1, "updatedExisting": true })
        }
        None if upsert => {
            let mut inserted = upsert_seed(&query);
            apply_update(&mut inserted, &update).map_err(bad_value)?;
            if !inserted.contains_key("_id") {
                inserted.insert("_id", ObjectId::new());
            }

            let id = inserted.get("_id").cloned();
            if coll.iter().any(|doc| doc.get("_id") == id.as_ref()) {
                return Err(error_reply(
                    codes::DUPLICATE_KEY,
                    &format!(
                        "E11000 duplicate key error collection: {} index: _id_ dup key: {{ _id: {} }}",
                        coll_name,
                        id.unwrap_or(Bson::Null)
                    ),
                ));
            }
            coll.push(inserted.clone());

            let value = if return_new {
                Bson::Document(inserted)
            } else {
                Bson::Null
            };
            let upserted = id.unwrap_or(Bson::Null);
            (value, doc! { "n": 1, "updatedExisting": false, "upserted": upserted })
        }
        None => (Bson::Null, doc! { "n": 0, "updatedExisting": false }),
    };

    let mut reply = doc! {
        "ok": 1.0,
        "lastErrorObject": last_error,
        "value": value,
    };
    if let Some(wc_error) = state.write_concern_error.take() {
        reply.insert(WRITE_CONCERN_ERROR_FIELD, wc_error.to_document());
    }
    Ok(reply)
}

impl RemoteCommandTargeter for MemoryConfigServer {
    fn find_host(&self, read_pref: ReadPreference) -> Result<HostAndPort> {
        if !self.state.lock().reachable {
            return Err(LockError::HostUnavailable(format!(
                "no host matching {:?} is reachable",
                read_pref
            )));
        }
        match read_pref {
            ReadPreference::SecondaryOnly => Err(LockError::HostUnavailable(
                "single node config server has no secondaries".to_string(),
            )),
            _ => Ok(self.host.clone()),
        }
    }
}

impl RemoteCommandRunner for MemoryConfigServer {
    fn run_command(&self, request: &RemoteCommandRequest) -> Result<RemoteCommandResponse> {
        let started = Instant::now();

        if !self.state.lock().reachable {
            return Err(LockError::Execution(format!(
                "connection to {} refused",
                request.target
            )));
        }
        if request.target != self.host {
            return Err(LockError::Execution(format!(
                "unknown host {}",
                request.target
            )));
        }

        tracing::trace!("Executing on {}: {}", request.db_name, request.cmd_obj);
        let data = self.execute(&request.db_name, &request.cmd_obj);
        Ok(RemoteCommandResponse::new(data, started.elapsed()))
    }
}
