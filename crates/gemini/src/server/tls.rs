use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::server::{ApplicationError, TlsOptions};

/// Builds the acceptor performing the per-connection handshake.
pub(crate) fn acceptor(options: &TlsOptions) -> Result<TlsAcceptor, ApplicationError> {
    let certs = load_certs(&options.cert_path)?;
    let key = load_key(&options.key_path)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(ApplicationError::tls)?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(ApplicationError::tls)?;
    config.alpn_protocols = options.alpn_protocols.clone();

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ApplicationError> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(ApplicationError::tls(format!("no certificates found in {}", path.display())));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, ApplicationError> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| ApplicationError::tls(format!("no private key found in {}", path.display())))
}
