//! Request Construction Tests
//!
//! Tests for the findAndModify builder and write concern rendering.

use std::time::Duration;

use bson::doc;
use distlock::config::Namespace;
use distlock::protocol::{
    server_status_command, FindAndModifyRequest, WriteAcknowledgement, WriteConcern,
    WriteConcernErrorDetail,
};

fn locks_ns() -> Namespace {
    "config.locks".parse().unwrap()
}

// =============================================================================
// Write Concern Tests
// =============================================================================

#[test]
fn test_majority_journaled_write_concern() {
    let wc = WriteConcern::majority_journaled(Duration::from_millis(2500));

    assert_eq!(wc.w, WriteAcknowledgement::Majority);
    assert!(wc.journal);
    assert_eq!(
        wc.to_document(),
        doc! { "w": "majority", "j": true, "wtimeout": 2500_i64 }
    );
}

#[test]
fn test_numeric_write_concern() {
    let wc = WriteConcern {
        w: WriteAcknowledgement::Nodes(2),
        journal: false,
        timeout: Duration::ZERO,
    };

    assert_eq!(wc.to_document(), doc! { "w": 2, "j": false, "wtimeout": 0_i64 });
}

#[test]
fn test_write_concern_error_detail_parse() {
    let detail = WriteConcernErrorDetail::parse(&doc! {
        "code": 64,
        "errmsg": "waiting for replication timed out",
        "errInfo": { "wtimeout": true },
    })
    .unwrap();

    assert_eq!(detail.code, 64);
    assert_eq!(detail.message(), "waiting for replication timed out");
    assert_eq!(detail.info, Some(doc! { "wtimeout": true }));

    let reparsed = WriteConcernErrorDetail::parse(&detail.to_document()).unwrap();
    assert_eq!(reparsed, detail);
}

// =============================================================================
// findAndModify Tests
// =============================================================================

#[test]
fn test_minimal_request_omits_unset_options() {
    let request = FindAndModifyRequest::make_update(
        locks_ns(),
        doc! { "ts": 1 },
        doc! { "$set": { "state": 0 } },
    );

    assert_eq!(
        request.to_document(),
        doc! {
            "findAndModify": "locks",
            "query": { "ts": 1 },
            "update": { "$set": { "state": 0 } },
        }
    );
}

#[test]
fn test_full_request_shape() {
    let mut request = FindAndModifyRequest::make_update(
        locks_ns(),
        doc! { "_id": "chunkA", "state": 0 },
        doc! { "$set": { "state": 2 } },
    );
    request
        .set_upsert(true)
        .set_should_return_new(true)
        .set_write_concern(WriteConcern::majority_journaled(Duration::from_secs(15)));

    let cmd = request.to_document();

    // The command name must come first.
    assert_eq!(cmd.keys().next().map(String::as_str), Some("findAndModify"));
    assert_eq!(cmd.get_str("findAndModify").unwrap(), "locks");
    assert!(cmd.get_bool("upsert").unwrap());
    assert!(cmd.get_bool("new").unwrap());
    assert_eq!(
        cmd.get_document("writeConcern").unwrap(),
        &doc! { "w": "majority", "j": true, "wtimeout": 15000_i64 }
    );
    assert_eq!(request.namespace().db(), "config");
}

#[test]
fn test_server_status_command() {
    assert_eq!(server_status_command(), doc! { "serverStatus": 1 });
}
