//! Client identity and signing material.
//!
//! # Data Flow
//! ```text
//! certificate path  → certificate.rs (read PEM, parse X.509)
//!                   → x509_identity.rs (bind to MSP id)
//! key directory     → signer.rs (pick file, parse PEM key, build signer)
//! ```
//!
//! # Security Constraints
//! - Key material is read fresh for every call and never cached
//! - Never log private keys or signatures

pub mod certificate;
pub mod paths;
pub mod signer;
pub mod x509_identity;

pub use certificate::{load_certificate, Certificate};
pub use signer::{load_signer, PrivateKeySigner, Signer};
pub use x509_identity::ClientIdentity;
