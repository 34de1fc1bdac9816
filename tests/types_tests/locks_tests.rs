//! Record and Configuration Tests
//!
//! Tests for lock/ping record decoding, config building and host parsing.

use std::time::Duration;

use bson::oid::ObjectId;
use bson::{doc, Bson};
use chrono::{TimeZone, Utc};
use distlock::config::Namespace;
use distlock::network::HostAndPort;
use distlock::{CatalogConfig, LockError, LockPing, LockRecord, LockSessionId, LockState};

fn locked_doc(ts: ObjectId) -> bson::Document {
    doc! {
        "_id": "chunkA",
        "state": 2,
        "ts": ts,
        "process": "host1:27017:1700000000:42",
        "who": "host1:27017:1700000000:42:conn7",
        "when": bson::DateTime::from_millis(1_700_000_000_000),
        "why": "migrating chunk",
    }
}

// =============================================================================
// Lock Record Tests
// =============================================================================

#[test]
fn test_parse_locked_record() {
    let ts = ObjectId::new();
    let record = LockRecord::from_document(&locked_doc(ts)).unwrap();

    assert_eq!(record.name, "chunkA");
    assert_eq!(record.state, LockState::Locked);
    assert!(record.is_locked());
    assert_eq!(record.lock_session_id, Some(LockSessionId::from(ts)));
    assert_eq!(record.process.as_deref(), Some("host1:27017:1700000000:42"));
    assert_eq!(record.why.as_deref(), Some("migrating chunk"));
    assert_eq!(
        record.when,
        Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
    );
}

#[test]
fn test_record_document_round_trip() {
    let ts = ObjectId::new();
    let original = locked_doc(ts);
    let record = LockRecord::from_document(&original).unwrap();

    assert_eq!(record.to_document(), original);
}

#[test]
fn test_unlocked_record_needs_only_name_and_state() {
    let record = LockRecord::from_document(&doc! { "_id": "balancer", "state": 0 }).unwrap();

    assert_eq!(record.state, LockState::Unlocked);
    assert!(!record.is_locked());
    assert_eq!(record.lock_session_id, None);
}

#[test]
fn test_state_accepts_any_integral_width() {
    for state in [Bson::Int32(0), Bson::Int64(0), Bson::Double(0.0)] {
        let record = LockRecord::from_document(&doc! { "_id": "a", "state": state }).unwrap();
        assert_eq!(record.state, LockState::Unlocked);
    }
}

#[test]
fn test_locked_record_missing_holder_fields_fails() {
    for field in ["ts", "process", "who", "why"] {
        let mut doc = locked_doc(ObjectId::new());
        doc.remove(field);

        match LockRecord::from_document(&doc) {
            Err(LockError::FailedToParse(msg)) => assert!(msg.contains(field), "{}", msg),
            other => panic!("Expected parse failure for missing {}, got {:?}", field, other),
        }
    }
}

#[test]
fn test_lock_prep_counts_as_held() {
    let mut doc = locked_doc(ObjectId::new());
    doc.insert("state", 1);

    let record = LockRecord::from_document(&doc).unwrap();
    assert_eq!(record.state, LockState::LockPrep);
    assert!(record.is_locked());
}

#[test]
fn test_invalid_records_fail_to_parse() {
    let cases = vec![
        doc! { "state": 0 },
        doc! { "_id": "", "state": 0 },
        doc! { "_id": 7, "state": 0 },
        doc! { "_id": "a" },
        doc! { "_id": "a", "state": 5 },
        doc! { "_id": "a", "state": "locked" },
        doc! { "_id": "a", "state": 0, "ts": "not-an-oid" },
        doc! { "_id": "a", "state": 0, "when": "yesterday" },
        doc! { "_id": "a", "state": 0, "who": 1 },
    ];

    for doc in cases {
        assert!(
            matches!(LockRecord::from_document(&doc), Err(LockError::FailedToParse(_))),
            "{} should not parse",
            doc
        );
    }
}

#[test]
fn test_lock_details_shape() {
    let session = LockSessionId::new();
    let when = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let details = LockRecord::lock_details(session, "conn1", "proc1", when, "testing");

    assert_eq!(
        details,
        doc! {
            "ts": session.as_object_id(),
            "state": 2,
            "who": "conn1",
            "process": "proc1",
            "when": bson::DateTime::from_millis(1_700_000_000_000),
            "why": "testing",
        }
    );
}

// =============================================================================
// Session Id Tests
// =============================================================================

#[test]
fn test_session_ids_are_unique() {
    let a = LockSessionId::new();
    let b = LockSessionId::new();
    assert_ne!(a, b);
}

#[test]
fn test_session_id_hex_round_trip() {
    let id = LockSessionId::new();
    let parsed: LockSessionId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);

    assert!(matches!(
        "xyz".parse::<LockSessionId>(),
        Err(LockError::FailedToParse(_))
    ));
}

// =============================================================================
// Lock Ping Tests
// =============================================================================

#[test]
fn test_lock_ping_document() {
    let at = Utc.timestamp_millis_opt(1_700_000_000_500).unwrap();
    let ping = LockPing::new("proc1", at);

    let doc = ping.to_document().unwrap();
    assert_eq!(
        doc,
        doc! { "_id": "proc1", "ping": bson::DateTime::from_millis(1_700_000_000_500) }
    );

    let parsed = LockPing::from_document(&doc).unwrap();
    assert_eq!(parsed.process, "proc1");
    assert_eq!(parsed.ping_time(), at);
}

#[test]
fn test_lock_ping_missing_field() {
    assert!(matches!(
        LockPing::from_document(&doc! { "_id": "proc1" }),
        Err(LockError::FailedToParse(_))
    ));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_default_config() {
    let config = CatalogConfig::default();

    assert_eq!(config.write_concern_timeout, Duration::from_secs(15));
    assert_eq!(config.locks_namespace.to_string(), "config.locks");
    assert_eq!(config.lock_pings_namespace.to_string(), "config.lockpings");
    assert_eq!(config.admin_db, "admin");
}

#[test]
fn test_config_builder() {
    let config = CatalogConfig::builder()
        .write_concern_timeout_ms(500)
        .locks_namespace("test.locks")
        .lock_pings_namespace("test.pings")
        .admin_db("root")
        .build()
        .unwrap();

    assert_eq!(config.write_concern_timeout, Duration::from_millis(500));
    assert_eq!(config.locks_namespace.db(), "test");
    assert_eq!(config.locks_namespace.coll(), "locks");
    assert_eq!(config.lock_pings_namespace.coll(), "pings");
    assert_eq!(config.admin_db, "root");
}

#[test]
fn test_config_builder_rejects_bad_namespaces() {
    for ns in ["locks", ".locks", "config.", ""] {
        let result = CatalogConfig::builder().locks_namespace(ns).build();
        assert!(matches!(result, Err(LockError::Config(_))), "{:?} accepted", ns);
    }

    assert!(matches!(
        CatalogConfig::builder().admin_db("").build(),
        Err(LockError::Config(_))
    ));
}

#[test]
fn test_namespace_keeps_dots_in_collection() {
    let ns: Namespace = "config.system.sessions".parse().unwrap();
    assert_eq!(ns.db(), "config");
    assert_eq!(ns.coll(), "system.sessions");
}

// =============================================================================
// Host Tests
// =============================================================================

#[test]
fn test_host_and_port_parsing() {
    let host: HostAndPort = "cfg1.example.net:27019".parse().unwrap();
    assert_eq!(host.host(), "cfg1.example.net");
    assert_eq!(host.port(), 27019);
    assert_eq!(host.to_string(), "cfg1.example.net:27019");

    let default_port: HostAndPort = "cfg2".parse().unwrap();
    assert_eq!(default_port.port(), 27017);

    assert!("cfg3:notaport".parse::<HostAndPort>().is_err());
    assert!(":27017".parse::<HostAndPort>().is_err());
}
