//! X.509 certificate loading.
//!
//! # Responsibilities
//! - Read a PEM file (leading `~` expanded)
//! - Decode the first CERTIFICATE block
//! - Check that the DER content parses as X.509
//!
//! Anything else in the file (chain certificates, text dumps, key blocks) is
//! discarded. [`Certificate::pem`] is re-encoded from the one parsed block, so
//! the serialized identity and the TLS trust anchor carry exactly that
//! certificate.

use std::fs;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{BridgeError, BridgeResult};
use crate::identity::paths::expand_home;

const PEM_LINE_WIDTH: usize = 64;

/// A parsed, verifiable X.509 certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    pem: Vec<u8>,
    der: Vec<u8>,
    subject: String,
    issuer: String,
}

impl Certificate {
    /// Parse a PEM-encoded certificate.
    pub fn from_pem(pem: &[u8]) -> BridgeResult<Self> {
        let der = match rustls_pemfile::certs(&mut &pem[..]).next() {
            Some(Ok(der)) => der,
            Some(Err(e)) => return Err(BridgeError::Parse(format!("Invalid PEM: {}", e))),
            None => {
                return Err(BridgeError::Parse(
                    "No CERTIFICATE block found in PEM input".to_string(),
                ))
            }
        };

        let (_, parsed) = x509_parser::parse_x509_certificate(der.as_ref())
            .map_err(|e| BridgeError::Parse(format!("X.509 parse failure: {}", e)))?;

        Ok(Self {
            subject: parsed.subject().to_string(),
            issuer: parsed.issuer().to_string(),
            pem: encode_pem(der.as_ref()),
            der: der.as_ref().to_vec(),
        })
    }

    /// Single-block PEM encoding of this certificate.
    pub fn pem(&self) -> &[u8] {
        &self.pem
    }

    /// DER encoding of the certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .finish()
    }
}

fn encode_pem(der: &[u8]) -> Vec<u8> {
    let body = STANDARD.encode(der);
    let mut pem = Vec::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.extend_from_slice(b"-----BEGIN CERTIFICATE-----\n");
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.extend_from_slice(line);
        pem.push(b'\n');
    }
    pem.extend_from_slice(b"-----END CERTIFICATE-----\n");
    pem
}

/// Read and parse a PEM certificate from `path`.
pub fn load_certificate(path: &str) -> BridgeResult<Certificate> {
    let resolved = expand_home(path)?;
    let pem = fs::read(&resolved).map_err(|e| BridgeError::io(&resolved, e))?;
    let certificate = Certificate::from_pem(&pem)?;

    tracing::debug!(
        path = %resolved.display(),
        subject = %certificate.subject(),
        "Certificate loaded"
    );

    Ok(certificate)
}
