//! Response parsing
//!
//! Pure functions over a command reply document.
//!
//! ## findAndModify Reply Precedence
//! 1. `ok` is not truthy           -> the command failure, verbatim
//! 2. `writeConcernError` present  -> `WriteConcernFailed` (or `UnsupportedFormat`
//!                                    if the sub-document is malformed)
//! 3. `value` is a document        -> that document
//!    `value` is anything else     -> `UnsupportedFormat`
//! 4. `value` absent or null       -> `None` (nothing matched)

use bson::oid::ObjectId;
use bson::{Bson, Document};
use chrono::{DateTime, Utc};

use super::WriteConcernErrorDetail;
use crate::error::{codes, LockError, Result};
use crate::types::{bson_integer, bson_type_name, ServerInfo};

pub const OK_FIELD: &str = "ok";
pub const CODE_FIELD: &str = "code";
pub const ERRMSG_FIELD: &str = "errmsg";
pub const LEGACY_ERR_FIELD: &str = "$err";
pub const WRITE_CONCERN_ERROR_FIELD: &str = "writeConcernError";
pub const FIND_AND_MODIFY_VALUE_FIELD: &str = "value";
pub const LOCAL_TIME_FIELD: &str = "localTime";
pub const GLE_STATS_FIELD: &str = "$gleStats";
pub const ELECTION_ID_FIELD: &str = "electionId";

/// Decode the overall command status of a reply
pub fn command_status(response: &Document) -> Result<()> {
    let ok = match response.get(OK_FIELD) {
        Some(Bson::Boolean(b)) => *b,
        Some(Bson::Double(v)) => *v != 0.0,
        Some(other) => bson_integer(other).map(|v| v != 0).unwrap_or(false),
        None => false,
    };

    if ok {
        return Ok(());
    }

    let code = response
        .get(CODE_FIELD)
        .and_then(bson_integer)
        .and_then(|c| i32::try_from(c).ok())
        .unwrap_or(codes::UNKNOWN_ERROR);

    let message = [ERRMSG_FIELD, LEGACY_ERR_FIELD]
        .iter()
        .find_map(|field| match response.get(*field) {
            Some(Bson::String(s)) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "unknown error".to_string());

    Err(LockError::Command { code, message })
}

/// Extract the post-update document of a findAndModify reply
pub fn extract_find_and_modify_result(response: &Document) -> Result<Option<Document>> {
    command_status(response)?;

    match response.get(WRITE_CONCERN_ERROR_FIELD) {
        Some(Bson::Document(wc_error)) => {
            let detail = WriteConcernErrorDetail::parse(wc_error)?;
            return Err(LockError::WriteConcernFailed(detail.message().to_string()));
        }
        Some(other) => {
            return Err(LockError::UnsupportedFormat(format!(
                "'{}' field must be an object, found {}",
                WRITE_CONCERN_ERROR_FIELD,
                bson_type_name(other)
            )));
        }
        None => {}
    }

    match response.get(FIND_AND_MODIFY_VALUE_FIELD) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::Document(doc)) => Ok(Some(doc.clone())),
        Some(_) => Err(LockError::UnsupportedFormat(
            "expected an object from the findAndModify response 'value' field".to_string(),
        )),
    }
}

/// Extract the leadership epoch from a status reply
pub fn extract_election_id(response: &Document) -> Result<ObjectId> {
    let gle_stats = match response.get(GLE_STATS_FIELD) {
        Some(Bson::Document(stats)) => stats,
        Some(other) => {
            return Err(LockError::UnsupportedFormat(format!(
                "'{}' field must be an object, found {}",
                GLE_STATS_FIELD,
                bson_type_name(other)
            )))
        }
        None => {
            return Err(LockError::UnsupportedFormat(format!(
                "missing '{}' field",
                GLE_STATS_FIELD
            )))
        }
    };

    match gle_stats.get(ELECTION_ID_FIELD) {
        Some(Bson::ObjectId(oid)) => Ok(*oid),
        Some(other) => Err(LockError::UnsupportedFormat(format!(
            "'{}' field must be an objectId, found {}",
            ELECTION_ID_FIELD,
            bson_type_name(other)
        ))),
        None => Err(LockError::UnsupportedFormat(format!(
            "missing '{}.{}' field",
            GLE_STATS_FIELD, ELECTION_ID_FIELD
        ))),
    }
}

/// Extract the responding host's clock from a status reply
pub fn extract_local_time(response: &Document) -> Result<DateTime<Utc>> {
    match response.get(LOCAL_TIME_FIELD) {
        Some(Bson::DateTime(dt)) => Ok(dt.to_chrono()),
        Some(other) => Err(LockError::UnsupportedFormat(format!(
            "'{}' field must be a date, found {}",
            LOCAL_TIME_FIELD,
            bson_type_name(other)
        ))),
        None => Err(LockError::UnsupportedFormat(format!(
            "missing '{}' field",
            LOCAL_TIME_FIELD
        ))),
    }
}

/// Decode a full status reply
pub fn extract_server_info(response: &Document) -> Result<ServerInfo> {
    command_status(response)?;
    let server_time = extract_local_time(response)?;
    let election_id = extract_election_id(response)?;
    Ok(ServerInfo::new(server_time, election_id))
}
