//! Certificate material for the mutual-TLS session.
//!
//! Everything here runs before the first request: an unreadable trust root or
//! a malformed client keypair is a setup error, never a network error.

use crate::config::Config;
use crate::error::{BetfairError, Result};
use reqwest::{Certificate, Client, Identity};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::fs;
use tracing::debug;

/// Read every certificate in a PEM bundle.
pub fn load_root_certificates(path: &str) -> Result<Vec<Certificate>> {
    let pem = fs::read(path).map_err(|e| BetfairError::setup(path, e))?;
    let certs = parse_certificates(path, &pem)?;

    certs
        .iter()
        .map(|der| Certificate::from_der(der.as_ref()).map_err(|e| BetfairError::setup(path, e)))
        .collect()
}

/// Load the client certificate chain and its private key as one identity.
pub fn load_identity(cert_path: &str, key_path: &str) -> Result<Identity> {
    let cert_pem = fs::read(cert_path).map_err(|e| BetfairError::setup(cert_path, e))?;
    let key_pem = fs::read(key_path).map_err(|e| BetfairError::setup(key_path, e))?;

    let chain = parse_certificates(cert_path, &cert_pem)?;
    let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .map_err(|e| BetfairError::setup(key_path, e))?
        .ok_or_else(|| BetfairError::setup(key_path, "no private key found"))?;

    debug!(
        "Loaded client certificate chain of {} with {} key",
        chain.len(),
        key_kind(&key)
    );

    let mut pem = cert_pem;
    pem.push(b'\n');
    pem.extend_from_slice(&key_pem);
    Identity::from_pem(&pem).map_err(|e| BetfairError::setup(cert_path, e))
}

/// HTTPS client that presents the configured identity and trusts only the
/// configured root bundle.
pub fn build_http_client(config: &Config) -> Result<Client> {
    let root_ca_path = config.root_ca_path();
    let roots = load_root_certificates(root_ca_path)?;
    let identity = load_identity(&config.betfair.cert_path, &config.betfair.key_path)?;
    debug!("Trusting {} root certificate(s) from {}", roots.len(), root_ca_path);

    let mut builder = Client::builder()
        .use_rustls_tls()
        .tls_built_in_root_certs(false)
        .identity(identity);
    for root in roots {
        builder = builder.add_root_certificate(root);
    }
    builder.build().map_err(BetfairError::Client)
}

fn parse_certificates(path: &str, pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| BetfairError::setup(path, e))?;
    if certs.is_empty() {
        return Err(BetfairError::setup(path, "no certificates found"));
    }
    Ok(certs)
}

fn key_kind(key: &PrivateKeyDer<'_>) -> &'static str {
    match key {
        PrivateKeyDer::Pkcs1(_) => "PKCS#1 RSA",
        PrivateKeyDer::Sec1(_) => "SEC1 EC",
        PrivateKeyDer::Pkcs8(_) => "PKCS#8",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CLIENT_CERT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client.crt");
    const CLIENT_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client.key");
    const ROOT_CA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rootca.pem");

    fn garbage_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not a pem file").unwrap();
        file
    }

    #[test]
    fn test_load_root_certificates() {
        let roots = load_root_certificates(ROOT_CA).unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_missing_root_bundle_is_setup_error() {
        let err = load_root_certificates("/nonexistent/rootca.pem").unwrap_err();
        match err {
            BetfairError::Setup { path, .. } => assert_eq!(path, "/nonexistent/rootca.pem"),
            other => panic!("expected setup error, got {other:?}"),
        }
    }

    #[test]
    fn test_bundle_without_certificates_is_rejected() {
        let file = garbage_file();
        let path = file.path().to_str().unwrap();
        let err = load_root_certificates(path).unwrap_err();
        assert!(err.to_string().contains("no certificates found"));
    }

    #[test]
    fn test_load_identity() {
        assert!(load_identity(CLIENT_CERT, CLIENT_KEY).is_ok());
    }

    #[test]
    fn test_malformed_key_is_setup_error() {
        let file = garbage_file();
        let key_path = file.path().to_str().unwrap();
        let err = load_identity(CLIENT_CERT, key_path).unwrap_err();
        match err {
            BetfairError::Setup { path, message } => {
                assert_eq!(path, key_path);
                assert!(message.contains("no private key"));
            }
            other => panic!("expected setup error, got {other:?}"),
        }
    }

    #[test]
    fn test_key_passed_as_certificate_is_rejected() {
        let err = load_identity(CLIENT_KEY, CLIENT_KEY).unwrap_err();
        assert!(matches!(err, BetfairError::Setup { .. }));
    }
}
