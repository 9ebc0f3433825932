//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every connection field the bridge needs is present
//! - Validate value ranges (timeouts > 0, endpoint has a port)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::{BridgeConfig, ConnectionProfile, GatewayTimeouts};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a complete configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_profile(&config.connection);
    errors.extend(validate_timeouts(&config.timeouts));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_profile(profile: &ConnectionProfile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let required = [
        ("connection.channel_name", &profile.channel_name),
        ("connection.contract_name", &profile.contract_name),
        ("connection.msp_id", &profile.msp_id),
        ("connection.cert_path", &profile.cert_path),
        ("connection.key_path", &profile.key_path),
        ("connection.tls_cert_path", &profile.tls_cert_path),
        ("connection.peer_endpoint", &profile.peer_endpoint),
        ("connection.gateway_peer", &profile.gateway_peer),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    if !profile.peer_endpoint.is_empty() && !endpoint_has_port(&profile.peer_endpoint) {
        errors.push(ValidationError::new(
            "connection.peer_endpoint",
            format!("'{}' must be host:port", profile.peer_endpoint),
        ));
    }

    errors
}

fn validate_timeouts(timeouts: &GatewayTimeouts) -> Vec<ValidationError> {
    let values = [
        ("timeouts.evaluate_secs", timeouts.evaluate_secs),
        ("timeouts.endorse_secs", timeouts.endorse_secs),
        ("timeouts.submit_secs", timeouts.submit_secs),
        ("timeouts.commit_status_secs", timeouts.commit_status_secs),
        ("timeouts.connect_secs", timeouts.connect_secs),
    ];
    values
        .into_iter()
        .filter(|(_, secs)| *secs == 0)
        .map(|(field, _)| ValidationError::new(field, "must be greater than zero"))
        .collect()
}

fn endpoint_has_port(endpoint: &str) -> bool {
    let authority = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    match authority.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
