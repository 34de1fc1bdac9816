//! Protocol Module
//!
//! Builds the commands the lock catalog sends and decodes their replies.
//!
//! ## Commands
//! - `findAndModify` - atomic conditional update (grab, overtake, unlock, ping)
//! - `serverStatus`  - clock + election epoch of the primary
//!
//! ## Reply Envelope
//! ```text
//! ┌────────┬───────────────────┬─────────────────────────────┐
//! │  ok    │ writeConcernError │          value              │
//! │ 0 / 1  │ { code, errmsg }? │ document | null | absent    │
//! └────────┴───────────────────┴─────────────────────────────┘
//! ```

mod find_and_modify;
mod response;
mod write_concern;

pub use find_and_modify::FindAndModifyRequest;
pub use response::{
    command_status, extract_election_id, extract_find_and_modify_result, extract_local_time,
    extract_server_info,
};
pub use response::{
    CODE_FIELD, ELECTION_ID_FIELD, ERRMSG_FIELD, FIND_AND_MODIFY_VALUE_FIELD, GLE_STATS_FIELD,
    LOCAL_TIME_FIELD, OK_FIELD, WRITE_CONCERN_ERROR_FIELD,
};
pub use write_concern::{WriteAcknowledgement, WriteConcern, WriteConcernErrorDetail};

use bson::{doc, Document};

/// Status query issued against the admin database
pub fn server_status_command() -> Document {
    doc! { "serverStatus": 1 }
}
