//! Key-value client over a hex-encoding contract.
//!
//! # Responsibilities
//! - Map byte keys and values onto the contract's string arguments
//! - Route each operation through one bridge call (no reuse between calls)
//!
//! # Contract functions
//! ```text
//! put     {hex(key): hex(value), ...}   submit
//! get     hex(key)                      evaluate → hex(value)
//! getAll  {}                            evaluate → {hex(key): hex(value), ...}
//! delete  hex(key)                      submit
//! ```

use std::collections::BTreeMap;

use crate::bridge::{self, CallParams};
use crate::config::{BridgeConfig, ConnectionProfile, GatewayTimeouts};
use crate::error::{BridgeError, BridgeResult};

const PUT: &str = "put";
const GET: &str = "get";
const GET_ALL: &str = "getAll";
const DELETE: &str = "delete";

/// Byte-keyed view of one contract.
#[derive(Debug, Clone)]
pub struct LedgerKvClient {
    profile: ConnectionProfile,
    timeouts: GatewayTimeouts,
    strict_keys: bool,
}

impl LedgerKvClient {
    pub fn new(profile: ConnectionProfile) -> Self {
        Self {
            profile,
            timeouts: GatewayTimeouts::default(),
            strict_keys: false,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            profile: config.connection.clone(),
            timeouts: config.timeouts,
            strict_keys: config.keys.strict,
        }
    }

    pub fn with_timeouts(mut self, timeouts: GatewayTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    /// Write every pair of `batch` in one transaction.
    ///
    /// An empty batch is a no-op and never reaches the gateway.
    pub fn put(&self, batch: &BTreeMap<Vec<u8>, Vec<u8>>) -> BridgeResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let payload = encode_batch(batch)?;
        self.submit(PUT, payload.as_bytes())?;
        tracing::debug!(pairs = batch.len(), "Batch written");
        Ok(())
    }

    /// Read the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> BridgeResult<Vec<u8>> {
        let raw = self.evaluate(GET, hex::encode(key).as_bytes())?;
        decode_value(&raw)
    }

    /// Read every pair in the contract's state.
    pub fn get_all(&self) -> BridgeResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        let raw = self.evaluate(GET_ALL, b"{}")?;
        decode_map(&raw)
    }

    /// Delete the pair stored under `key`.
    pub fn remove(&self, key: &[u8]) -> BridgeResult<()> {
        self.submit(DELETE, hex::encode(key).as_bytes())?;
        Ok(())
    }

    fn submit(&self, function: &str, payload: &[u8]) -> BridgeResult<()> {
        let params = CallParams::from_profile(&self.profile, function, payload);
        bridge::write(&params, &self.timeouts, self.strict_keys).map(|_| ())
    }

    fn evaluate(&self, function: &str, payload: &[u8]) -> BridgeResult<Vec<u8>> {
        let params = CallParams::from_profile(&self.profile, function, payload);
        bridge::read(&params, &self.timeouts, self.strict_keys)
    }
}

fn encode_batch(batch: &BTreeMap<Vec<u8>, Vec<u8>>) -> BridgeResult<String> {
    let encoded: BTreeMap<String, String> = batch
        .iter()
        .map(|(k, v)| (hex::encode(k), hex::encode(v)))
        .collect();
    serde_json::to_string(&encoded)
        .map_err(|e| BridgeError::InvalidInput(format!("Cannot encode batch: {}", e)))
}

fn decode_value(raw: &[u8]) -> BridgeResult<Vec<u8>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| BridgeError::Parse(format!("Value is not UTF-8: {}", e)))?;
    hex::decode(text.trim()).map_err(|e| BridgeError::Parse(format!("Value is not hex: {}", e)))
}

fn decode_map(raw: &[u8]) -> BridgeResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    let encoded: BTreeMap<String, String> = serde_json::from_slice(raw).map_err(|e| {
        BridgeError::Parse(format!("Result is not a JSON object of strings: {}", e))
    })?;

    encoded
        .into_iter()
        .map(|(k, v)| -> BridgeResult<(Vec<u8>, Vec<u8>)> {
            let key = hex::decode(&k)
                .map_err(|e| BridgeError::Parse(format!("Key '{}' is not hex: {}", k, e)))?;
            let value = hex::decode(&v).map_err(|e| {
                BridgeError::Parse(format!("Value for key '{}' is not hex: {}", k, e))
            })?;
            Ok((key, value))
        })
        .collect()
}
