//! Disk tier contract tests
//!
//! Point and batch operations, wipe-and-rebuild cleanup (explicit and
//! scheduled), persistence across reopens at the same path, and lifecycle
//! behavior.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use permafrost::{CacheError, DiskTier, DiskTierConfig};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    id: u64,
    body: String,
}

fn config_at(dir: &TempDir) -> DiskTierConfig {
    DiskTierConfig {
        path: dir.path().join("store"),
        ..DiskTierConfig::default()
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    tier.save(&"k".to_string(), &"v".to_string()).unwrap();
    let loaded: Option<String> = tier.load(&"k".to_string()).unwrap();
    assert_eq!(loaded, Some("v".to_string()));

    let payload = Payload {
        id: 9,
        body: "nine".to_string(),
    };
    tier.save(&"record".to_string(), &payload).unwrap();
    let loaded: Option<Payload> = tier.load(&"record".to_string()).unwrap();
    assert_eq!(loaded, Some(payload));
}

#[test]
fn missing_keys_load_as_none() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    let loaded: Option<String> = tier.load(&"never-saved".to_string()).unwrap();
    assert_eq!(loaded, None);
}

#[test]
fn batch_save_then_batch_load() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    let mut entries = HashMap::new();
    for i in 0..10u32 {
        entries.insert(format!("key-{i}"), format!("value-{i}"));
    }
    tier.save_batch(&entries).unwrap();

    let keys: Vec<String> = (0..10).map(|i| format!("key-{i}")).collect();
    let loaded: HashMap<String, String> = tier.load_batch(&keys).unwrap();
    assert_eq!(loaded, entries);
}

#[test]
fn batch_load_omits_absent_keys() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    tier.save(&"present".to_string(), &"value".to_string()).unwrap();

    let keys = vec!["present".to_string(), "absent".to_string()];
    let loaded: HashMap<String, String> = tier.load_batch(&keys).unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get("present"), Some(&"value".to_string()));
    assert!(!loaded.contains_key("absent"));
}

#[test]
fn empty_batches_succeed() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    tier.save_batch(&HashMap::<String, String>::new()).unwrap();
    let loaded: HashMap<String, String> = tier.load_batch(&[]).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn large_batches_round_trip() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    let mut entries = HashMap::new();
    for i in 0..1000u32 {
        entries.insert(format!("key-{i}"), format!("value-{i}"));
    }
    tier.save_batch(&entries).unwrap();

    for probe in [0u32, 500, 999] {
        let loaded: Option<String> = tier.load(&format!("key-{probe}")).unwrap();
        assert_eq!(loaded, Some(format!("value-{probe}")));
    }
}

#[test]
fn values_with_special_characters_round_trip() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    let value = "special chars: \u{e5}\u{e4}\u{f6} \u{f1} \u{4e2d}\u{6587} \u{1f680} \n\t\r".to_string();
    tier.save(&"special".to_string(), &value).unwrap();

    let loaded: Option<String> = tier.load(&"special".to_string()).unwrap();
    assert_eq!(loaded, Some(value));
}

#[test]
fn heterogeneous_types_coexist_and_mismatches_are_rejected() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    tier.save(&"count".to_string(), &42u64).unwrap();
    tier.save(&7u32, &"seven".to_string()).unwrap();

    let count: Option<u64> = tier.load(&"count".to_string()).unwrap();
    assert_eq!(count, Some(42));
    let seven: Option<String> = tier.load(&7u32).unwrap();
    assert_eq!(seven, Some("seven".to_string()));

    // Decoding a stored u64 as a String trips the codec's type tag.
    let err = tier.load::<String, String>(&"count".to_string()).unwrap_err();
    assert!(matches!(err, CacheError::Deserialization(_)));
}

#[test]
fn cleanup_wipes_everything_and_store_stays_usable() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    tier.save(&"k".to_string(), &"v".to_string()).unwrap();
    assert_eq!(
        tier.load::<String, String>(&"k".to_string()).unwrap(),
        Some("v".to_string())
    );

    tier.cleanup().unwrap();
    assert_eq!(tier.load::<String, String>(&"k".to_string()).unwrap(), None);

    // The store reopened; new writes land normally.
    tier.save(&"k2".to_string(), &"v2".to_string()).unwrap();
    assert_eq!(
        tier.load::<String, String>(&"k2".to_string()).unwrap(),
        Some("v2".to_string())
    );
}

#[test]
fn scheduled_cleanup_wipes_on_its_interval() {
    let dir = TempDir::new().unwrap();
    let config = DiskTierConfig {
        cleanup_interval: Duration::from_millis(100),
        ..config_at(&dir)
    };
    let tier = DiskTier::open(config).unwrap();

    tier.save(&"k".to_string(), &"v".to_string()).unwrap();
    assert_eq!(
        tier.load::<String, String>(&"k".to_string()).unwrap(),
        Some("v".to_string())
    );

    thread::sleep(Duration::from_millis(300));
    assert_eq!(tier.load::<String, String>(&"k".to_string()).unwrap(), None);
}

#[test]
fn entries_persist_across_reopen() {
    let dir = TempDir::new().unwrap();

    let tier = DiskTier::open(config_at(&dir)).unwrap();
    tier.save(&"k".to_string(), &"v".to_string()).unwrap();
    tier.close().unwrap();
    drop(tier);

    let reopened = DiskTier::open(config_at(&dir)).unwrap();
    assert_eq!(
        reopened.load::<String, String>(&"k".to_string()).unwrap(),
        Some("v".to_string())
    );
}

#[test]
fn close_is_idempotent_and_rejects_further_use() {
    let dir = TempDir::new().unwrap();
    let tier = DiskTier::open(config_at(&dir)).unwrap();

    tier.close().unwrap();
    tier.close().unwrap();
    assert!(tier.is_closed());

    let err = tier.save(&"k".to_string(), &"v".to_string()).unwrap_err();
    assert!(err.is_closed());
    let err = tier.load::<String, String>(&"k".to_string()).unwrap_err();
    assert!(err.is_closed());
    let err = tier.cleanup().unwrap_err();
    assert!(err.is_closed());
    let err = tier
        .load_batch::<String, String>(&["k".to_string()])
        .unwrap_err();
    assert!(err.is_closed());
}

#[test]
fn closing_stops_the_cleanup_worker() {
    let dir = TempDir::new().unwrap();
    let config = DiskTierConfig {
        cleanup_interval: Duration::from_millis(50),
        ..config_at(&dir)
    };
    let tier = DiskTier::open(config).unwrap();

    tier.close().unwrap();

    // No further wipes happen after close; reopening finds whatever the
    // last state was without interference from a stray worker.
    thread::sleep(Duration::from_millis(150));
    let reopened = DiskTier::open(config_at(&dir)).unwrap();
    reopened
        .save(&"k".to_string(), &"v".to_string())
        .unwrap();
    assert_eq!(
        reopened.load::<String, String>(&"k".to_string()).unwrap(),
        Some("v".to_string())
    );
}
