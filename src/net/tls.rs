//! TLS configuration with a single pinned trust anchor.

use tonic::transport::{Certificate as TlsCertificate, ClientTlsConfig};

use crate::error::{BridgeError, BridgeResult};
use crate::identity::Certificate;

/// Build a client TLS configuration that trusts exactly `trust_anchor`.
///
/// `ClientTlsConfig` starts with an empty root store and only gains system
/// or webpki roots through `with_native_roots`/`with_webpki_roots`, neither
/// of which is called here. The root store is therefore the one certificate
/// held by `trust_anchor`, and the peer certificate must be valid for
/// `server_name`.
pub fn pinned_tls_config(
    trust_anchor: &Certificate,
    server_name: &str,
) -> BridgeResult<ClientTlsConfig> {
    if server_name.trim().is_empty() {
        return Err(BridgeError::Connection(
            "Expected peer identity (TLS server name) must not be empty".to_string(),
        ));
    }

    Ok(ClientTlsConfig::new()
        .ca_certificate(TlsCertificate::from_pem(trust_anchor.pem()))
        .domain_name(server_name))
}
