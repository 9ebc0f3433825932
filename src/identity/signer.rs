//! Private key loading and message signing.
//!
//! # Security
//! - The key is read from disk once per call and never logged or serialized
//! - `p256::ecdsa::SigningKey` zeroizes its scalar on drop
//! - Signatures are ECDSA P-256 over a caller-supplied SHA-256 digest,
//!   low-S normalized and DER encoded, as the gateway expects

use std::fs;
use std::path::{Path, PathBuf};

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use rustls_pemfile::Item;

use crate::error::{BridgeError, BridgeResult};
use crate::identity::paths::expand_home;

/// Something that can sign a message digest on behalf of the client.
pub trait Signer: Send + Sync {
    /// Sign a message digest, returning the encoded signature.
    fn sign(&self, digest: &[u8]) -> BridgeResult<Vec<u8>>;
}

impl<F> Signer for F
where
    F: Fn(&[u8]) -> BridgeResult<Vec<u8>> + Send + Sync,
{
    fn sign(&self, digest: &[u8]) -> BridgeResult<Vec<u8>> {
        self(digest)
    }
}

/// Signer bound to a single in-memory P-256 private key.
#[derive(Clone)]
pub struct PrivateKeySigner {
    key: SigningKey,
}

impl PrivateKeySigner {
    /// Build a signer from a PEM private key (PKCS#8 or SEC1).
    pub fn from_pem(pem: &[u8]) -> BridgeResult<Self> {
        let mut reader = pem;
        let item = loop {
            match rustls_pemfile::read_one(&mut reader) {
                Ok(Some(Item::Pkcs8Key(key))) => {
                    break SigningKey::from_pkcs8_der(key.secret_pkcs8_der()).map_err(|e| {
                        BridgeError::Parse(format!("Invalid PKCS#8 P-256 key: {}", e))
                    })?
                }
                Ok(Some(Item::Sec1Key(key))) => {
                    let secret = p256::SecretKey::from_sec1_der(key.secret_sec1_der())
                        .map_err(|e| BridgeError::Parse(format!("Invalid SEC1 P-256 key: {}", e)))?;
                    break SigningKey::from(secret);
                }
                Ok(Some(Item::Pkcs1Key(_))) => {
                    return Err(BridgeError::Parse(
                        "RSA private keys are not supported".to_string(),
                    ))
                }
                // Certificates or other blocks before the key are skipped.
                Ok(Some(_)) => continue,
                Ok(None) => {
                    return Err(BridgeError::Parse(
                        "No PRIVATE KEY block found in PEM input".to_string(),
                    ))
                }
                Err(e) => return Err(BridgeError::Parse(format!("Invalid PEM: {}", e))),
            }
        };

        Ok(Self { key: item })
    }

    /// Public half of the key, for verifying produced signatures.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.key)
    }
}

impl Signer for PrivateKeySigner {
    fn sign(&self, digest: &[u8]) -> BridgeResult<Vec<u8>> {
        let signature: Signature = self
            .key
            .sign_prehash(digest)
            .map_err(|e| BridgeError::Identity(format!("Signing failed: {}", e)))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

impl std::fmt::Debug for PrivateKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeySigner")
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Pick the key file inside `dir`.
///
/// Regular files only, ordered by file name so the choice does not depend
/// on the filesystem's listing order. With `strict`, more than one candidate
/// is an error; otherwise the first is used and the ambiguity is logged.
pub fn select_key_file(dir: &Path, strict: bool) -> BridgeResult<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|e| BridgeError::io(dir, e))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BridgeError::io(dir, e))?;
        let path = entry.path();
        // fs::metadata follows symlinks, which is how keystores are often laid out.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => candidates.push(path),
            Ok(_) => {}
            Err(e) => return Err(BridgeError::io(&path, e)),
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(BridgeError::NoKeyFound(dir.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        count if strict => Err(BridgeError::AmbiguousKey {
            path: dir.to_path_buf(),
            count,
        }),
        count => {
            let chosen = candidates.remove(0);
            tracing::warn!(
                key_dir = %dir.display(),
                candidates = count,
                chosen = %chosen.display(),
                "Key directory holds more than one file, using the first by name"
            );
            Ok(chosen)
        }
    }
}

/// Load the signing key found in `key_dir`.
pub fn load_signer(key_dir: &str, strict: bool) -> BridgeResult<PrivateKeySigner> {
    let dir = expand_home(key_dir)?;
    let key_path = select_key_file(&dir, strict)?;
    let pem = fs::read(&key_path).map_err(|e| BridgeError::io(&key_path, e))?;
    let signer = PrivateKeySigner::from_pem(&pem)?;

    tracing::debug!(key_dir = %dir.display(), "Signing key loaded");

    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use sha2::{Digest, Sha256};

    fn pkcs8_pem() -> String {
        rcgen::KeyPair::generate().unwrap().serialize_pem()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = PrivateKeySigner::from_pem(pkcs8_pem().as_bytes()).unwrap();
        let digest = Sha256::digest(b"proposal bytes");

        let der = signer.sign(&digest).unwrap();
        let signature = Signature::from_der(&der).unwrap();
        assert!(signer.verifying_key().verify_prehash(&digest, &signature).is_ok());
        assert!(signature.normalize_s().is_none(), "signature must be low-S");
    }

    #[test]
    fn test_invalid_key() {
        let result = PrivateKeySigner::from_pem(b"not a key");
        assert!(matches!(result, Err(BridgeError::Parse(_))));
    }

    #[test]
    fn test_closure_signer() {
        let signer = |digest: &[u8]| -> BridgeResult<Vec<u8>> { Ok(digest.to_vec()) };
        assert_eq!(signer.sign(b"abc").unwrap(), b"abc".to_vec());
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = select_key_file(dir.path(), false);
        assert!(matches!(result, Err(BridgeError::NoKeyFound(_))));
    }

    #[test]
    fn test_directories_are_not_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let result = select_key_file(dir.path(), false);
        assert!(matches!(result, Err(BridgeError::NoKeyFound(_))));
    }

    #[test]
    fn test_first_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_sk"), "b").unwrap();
        std::fs::write(dir.path().join("a_sk"), "a").unwrap();

        let chosen = select_key_file(dir.path(), false).unwrap();
        assert_eq!(chosen.file_name().unwrap(), "a_sk");
    }

    #[test]
    fn test_strict_rejects_ambiguity() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_sk"), "a").unwrap();
        std::fs::write(dir.path().join("b_sk"), "b").unwrap();

        let result = select_key_file(dir.path(), true);
        assert!(matches!(result, Err(BridgeError::AmbiguousKey { count: 2, .. })));
    }

    #[test]
    fn test_load_signer_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("priv_sk"), pkcs8_pem()).unwrap();

        let signer = load_signer(dir.path().to_str().unwrap(), true).unwrap();
        assert!(!signer.sign(&[7u8; 32]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let result = load_signer("/definitely/not/a/keystore", false);
        assert!(matches!(result, Err(BridgeError::Io { .. })));
    }
}
