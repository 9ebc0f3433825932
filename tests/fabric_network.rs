//! Scenarios against a running Fabric test network.
//!
//! Ignored by default. Point `LEDGER_BRIDGE_CONFIG` at a TOML config for an
//! asset contract and run `cargo test -- --ignored`. The key-value scenario
//! additionally needs `LEDGER_BRIDGE_KV_CONFIG` for a key-value contract.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ledger_bridge::bridge::{self, CallParams};
use ledger_bridge::config::{load_config, BridgeConfig};
use ledger_bridge::{BridgeError, LedgerKvClient};

mod common;

fn config_from(var: &str) -> BridgeConfig {
    let path = std::env::var(var).unwrap_or_else(|_| panic!("{} is not set", var));
    load_config(&PathBuf::from(path)).unwrap()
}

#[test]
#[ignore]
fn test_write_then_read_observes_commit() {
    let config = config_from("LEDGER_BRIDGE_CONFIG");

    let create = CallParams::from_profile(&config.connection, "CreateAsset", br#"{"value":"42"}"#);
    let committed = bridge::write(&create, &config.timeouts, config.keys.strict).unwrap();
    assert_eq!(committed.transaction_id.len(), 64);

    let query = CallParams::from_profile(&config.connection, "ReadAsset", br#"{"id":"42"}"#);
    let result = bridge::read(&query, &config.timeouts, config.keys.strict).unwrap();
    assert!(String::from_utf8_lossy(&result).contains("42"));
}

#[test]
#[ignore]
fn test_read_is_repeatable() {
    let config = config_from("LEDGER_BRIDGE_CONFIG");
    let query = CallParams::from_profile(&config.connection, "ReadAsset", br#"{"id":"42"}"#);

    let first = bridge::read(&query, &config.timeouts, config.keys.strict).unwrap();
    let second = bridge::read(&query, &config.timeouts, config.keys.strict).unwrap();
    assert_eq!(first, second);
}

#[test]
#[ignore]
fn test_wrong_trust_anchor_rejects_write() {
    let mut config = config_from("LEDGER_BRIDGE_CONFIG");
    let m = common::material();
    config.connection.tls_cert_path = m.other_anchor_path.clone();

    let create = CallParams::from_profile(&config.connection, "CreateAsset", br#"{"value":"43"}"#);
    let err = bridge::write(&create, &config.timeouts, config.keys.strict).unwrap_err();
    assert!(matches!(err, BridgeError::Connection(_) | BridgeError::Remote { .. }));
}

#[test]
#[ignore]
fn test_key_value_lifecycle() {
    let client = LedgerKvClient::from_config(&config_from("LEDGER_BRIDGE_KV_CONFIG"));

    let mut batch = BTreeMap::new();
    batch.insert(b"bridge-key".to_vec(), vec![0x00, 0x01, 0xfe]);
    client.put(&batch).unwrap();

    assert_eq!(client.get(b"bridge-key").unwrap(), vec![0x00, 0x01, 0xfe]);
    assert!(client.get_all().unwrap().contains_key(&b"bridge-key".to_vec()));

    client.remove(b"bridge-key").unwrap();
    assert!(client.get(b"bridge-key").is_err());
}
