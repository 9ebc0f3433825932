//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod gateway;

use std::ffi::CString;
use std::fs;
use std::net::{SocketAddr, TcpListener};
use std::os::raw::c_int;
use std::path::Path;
use std::thread;

use ledger_bridge::ffi::{ledger_bridge_read, ledger_bridge_write, LedgerReadResult};
use tempfile::TempDir;

/// On-disk identity material generated for one test.
pub struct Material {
    pub dir: TempDir,
    pub cert_path: String,
    pub key_dir: String,
    pub empty_key_dir: String,
    pub garbage_cert_path: String,
    pub other_anchor_path: String,
    /// The unrelated CA followed by the self-signed certificate.
    pub bundle_anchor_path: String,
    pub cert_pem: String,
    pub key_pem: String,
}

/// Generate a self-signed P-256 certificate (valid for `localhost`), its key
/// in a keystore directory, an empty keystore, a malformed certificate, an
/// unrelated CA certificate and a bundle of both certificates.
///
/// The same certificate serves as client identity, peer TLS certificate and
/// trust anchor.
pub fn material() -> Material {
    let dir = tempfile::tempdir().unwrap();
    let names = vec!["localhost".to_string(), "peer0.org1.example.com".to_string()];
    let certified = rcgen::generate_simple_self_signed(names).unwrap();
    let cert_pem = certified.cert.pem();
    let key_pem = certified.key_pair.serialize_pem();

    let cert_path = dir.path().join("signcerts.pem");
    fs::write(&cert_path, &cert_pem).unwrap();

    let key_dir = dir.path().join("keystore");
    fs::create_dir(&key_dir).unwrap();
    fs::write(key_dir.join("priv_sk"), &key_pem).unwrap();

    let empty_key_dir = dir.path().join("empty-keystore");
    fs::create_dir(&empty_key_dir).unwrap();

    let garbage_cert_path = dir.path().join("garbage.pem");
    fs::write(
        &garbage_cert_path,
        "-----BEGIN CERTIFICATE-----\nbm90IGEgY2VydA==\n-----END CERTIFICATE-----\n",
    )
    .unwrap();

    let other = rcgen::generate_simple_self_signed(vec!["other-ca".into()]).unwrap();
    let other_anchor_path = dir.path().join("other-ca.pem");
    fs::write(&other_anchor_path, other.cert.pem()).unwrap();

    let bundle_anchor_path = dir.path().join("bundle.pem");
    fs::write(&bundle_anchor_path, format!("{}{}", other.cert.pem(), cert_pem)).unwrap();

    Material {
        cert_path: display(&cert_path),
        key_dir: display(&key_dir),
        empty_key_dir: display(&empty_key_dir),
        garbage_cert_path: display(&garbage_cert_path),
        other_anchor_path: display(&other_anchor_path),
        bundle_anchor_path: display(&bundle_anchor_path),
        cert_pem,
        key_pem,
        dir,
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// C strings for one boundary call, in entry-point order.
pub struct CArgs {
    pub function: CString,
    pub network: CString,
    pub contract: CString,
    pub msp_id: CString,
    pub cert_path: CString,
    pub key_dir: CString,
    pub trust_anchor_path: CString,
    pub peer_endpoint: CString,
    pub peer_name: CString,
}

impl CArgs {
    pub fn new(m: &Material, function: &str, peer_endpoint: &str) -> Self {
        Self {
            function: c(function),
            network: c("mychannel"),
            contract: c("basic"),
            msp_id: c("Org1MSP"),
            cert_path: c(&m.cert_path),
            key_dir: c(&m.key_dir),
            trust_anchor_path: c(&m.cert_path),
            peer_endpoint: c(peer_endpoint),
            peer_name: c("localhost"),
        }
    }
}

pub fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// `ledger_bridge_write` with `args`.
pub fn write(args: &CArgs, payload: &[u8]) -> c_int {
    unsafe {
        ledger_bridge_write(
            payload.as_ptr(),
            payload.len(),
            args.function.as_ptr(),
            args.network.as_ptr(),
            args.contract.as_ptr(),
            args.msp_id.as_ptr(),
            args.cert_path.as_ptr(),
            args.key_dir.as_ptr(),
            args.trust_anchor_path.as_ptr(),
            args.peer_endpoint.as_ptr(),
            args.peer_name.as_ptr(),
        )
    }
}

/// `ledger_bridge_read` with `args`.
pub fn read(args: &CArgs, payload: &[u8]) -> LedgerReadResult {
    unsafe {
        ledger_bridge_read(
            payload.as_ptr(),
            payload.len(),
            args.function.as_ptr(),
            args.network.as_ptr(),
            args.contract.as_ptr(),
            args.msp_id.as_ptr(),
            args.cert_path.as_ptr(),
            args.key_dir.as_ptr(),
            args.trust_anchor_path.as_ptr(),
            args.peer_endpoint.as_ptr(),
            args.peer_name.as_ptr(),
        )
    }
}

/// A TCP peer that accepts connections and immediately drops them.
pub fn start_hangup_peer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => drop(stream),
                Err(_) => break,
            }
        }
    });
    addr
}
