//! Response Parsing Tests
//!
//! Tests for command status decoding and the findAndModify reply precedence.

use bson::oid::ObjectId;
use bson::{doc, Bson};
use chrono::{TimeZone, Utc};
use distlock::protocol::{
    command_status, extract_election_id, extract_find_and_modify_result, extract_local_time,
    extract_server_info,
};
use distlock::LockError;

// =============================================================================
// Command Status Tests
// =============================================================================

#[test]
fn test_command_status_ok_variants() {
    assert!(command_status(&doc! { "ok": 1.0 }).is_ok());
    assert!(command_status(&doc! { "ok": 1 }).is_ok());
    assert!(command_status(&doc! { "ok": 1_i64 }).is_ok());
    assert!(command_status(&doc! { "ok": true }).is_ok());
}

#[test]
fn test_command_status_failure_carries_code_and_message() {
    let err = command_status(&doc! { "ok": 0.0, "code": 10107, "errmsg": "not master" })
        .unwrap_err();

    assert_eq!(
        err,
        LockError::Command {
            code: 10107,
            message: "not master".to_string()
        }
    );
}

#[test]
fn test_command_status_missing_ok_is_failure() {
    let err = command_status(&doc! { "value": { "_id": "x" } }).unwrap_err();
    assert_eq!(err.code(), 8);
}

#[test]
fn test_command_status_legacy_err_field() {
    let err = command_status(&doc! { "ok": 0, "$err": "legacy failure" }).unwrap_err();
    match err {
        LockError::Command { code, message } => {
            assert_eq!(code, 8);
            assert_eq!(message, "legacy failure");
        }
        other => panic!("Expected command failure, got {:?}", other),
    }
}

// =============================================================================
// findAndModify Precedence Tests
// =============================================================================

#[test]
fn test_command_failure_wins_over_value() {
    let response = doc! {
        "ok": 0,
        "code": 11000,
        "errmsg": "duplicate key",
        "value": { "_id": "chunkA", "state": 2 },
    };

    let err = extract_find_and_modify_result(&response).unwrap_err();
    assert!(err.is_command_code(11000));
}

#[test]
fn test_command_failure_wins_over_write_concern_error() {
    let response = doc! {
        "ok": 0,
        "code": 13,
        "errmsg": "unauthorized",
        "writeConcernError": { "code": 64, "errmsg": "waiting for replication timed out" },
    };

    let err = extract_find_and_modify_result(&response).unwrap_err();
    assert!(err.is_command_code(13));
}

#[test]
fn test_write_concern_error_reported_even_when_ok() {
    let response = doc! {
        "ok": 1,
        "value": { "_id": "chunkA", "state": 2 },
        "writeConcernError": { "code": 64, "errmsg": "waiting for replication timed out" },
    };

    let err = extract_find_and_modify_result(&response).unwrap_err();
    assert_eq!(
        err,
        LockError::WriteConcernFailed("waiting for replication timed out".to_string())
    );
}

#[test]
fn test_write_concern_error_without_message() {
    let response = doc! { "ok": 1, "writeConcernError": { "code": 64 } };

    let err = extract_find_and_modify_result(&response).unwrap_err();
    assert_eq!(err, LockError::WriteConcernFailed(String::new()));
}

#[test]
fn test_malformed_write_concern_error_is_unsupported_format() {
    let missing_code = doc! { "ok": 1, "writeConcernError": { "errmsg": "no code" } };
    assert!(matches!(
        extract_find_and_modify_result(&missing_code),
        Err(LockError::UnsupportedFormat(_))
    ));

    let bad_message = doc! { "ok": 1, "writeConcernError": { "code": 64, "errmsg": 5 } };
    assert!(matches!(
        extract_find_and_modify_result(&bad_message),
        Err(LockError::UnsupportedFormat(_))
    ));

    let not_an_object = doc! { "ok": 1, "writeConcernError": "timed out" };
    assert!(matches!(
        extract_find_and_modify_result(&not_an_object),
        Err(LockError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_value_document_is_returned() {
    let response = doc! { "ok": 1, "value": { "_id": "chunkA", "state": 2 } };

    let value = extract_find_and_modify_result(&response).unwrap();
    assert_eq!(value, Some(doc! { "_id": "chunkA", "state": 2 }));
}

#[test]
fn test_null_value_is_no_match() {
    let response = doc! { "ok": 1, "value": Bson::Null };
    assert_eq!(extract_find_and_modify_result(&response).unwrap(), None);
}

#[test]
fn test_absent_value_is_no_match() {
    let response = doc! { "ok": 1 };
    assert_eq!(extract_find_and_modify_result(&response).unwrap(), None);
}

#[test]
fn test_non_document_value_is_unsupported_format() {
    for value in [Bson::String("x".into()), Bson::Int32(1), Bson::Array(vec![])] {
        let response = doc! { "ok": 1, "value": value };
        assert!(matches!(
            extract_find_and_modify_result(&response),
            Err(LockError::UnsupportedFormat(_))
        ));
    }
}

// =============================================================================
// Server Status Tests
// =============================================================================

#[test]
fn test_extract_server_info() {
    let election_id = ObjectId::new();
    let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let response = doc! {
        "ok": 1,
        "localTime": bson::DateTime::from_chrono(now),
        "$gleStats": { "lastOpTime": 0, "electionId": election_id },
    };

    let info = extract_server_info(&response).unwrap();
    assert_eq!(info.server_time, now);
    assert_eq!(info.election_id, election_id);
}

#[test]
fn test_missing_gle_stats_is_unsupported_format() {
    let response = doc! { "ok": 1, "localTime": bson::DateTime::now() };

    assert!(matches!(
        extract_election_id(&response),
        Err(LockError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        extract_server_info(&response),
        Err(LockError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_wrong_shape_election_id_is_unsupported_format() {
    let not_object = doc! { "$gleStats": 1 };
    assert!(matches!(
        extract_election_id(&not_object),
        Err(LockError::UnsupportedFormat(_))
    ));

    let missing_id = doc! { "$gleStats": { "lastOpTime": 0 } };
    assert!(matches!(
        extract_election_id(&missing_id),
        Err(LockError::UnsupportedFormat(_))
    ));

    let string_id = doc! { "$gleStats": { "electionId": "507f1f77bcf86cd799439011" } };
    assert!(matches!(
        extract_election_id(&string_id),
        Err(LockError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_local_time_must_be_a_date() {
    assert!(matches!(
        extract_local_time(&doc! {}),
        Err(LockError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        extract_local_time(&doc! { "localTime": 12345_i64 }),
        Err(LockError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_server_info_command_failure_first() {
    let response = doc! {
        "ok": 0,
        "code": 13,
        "errmsg": "unauthorized",
        "localTime": bson::DateTime::now(),
        "$gleStats": { "electionId": ObjectId::new() },
    };

    assert!(extract_server_info(&response).unwrap_err().is_command_code(13));
}
