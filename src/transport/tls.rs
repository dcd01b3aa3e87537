use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use tracing::{debug, warn};

use super::TlsSettings;
use crate::error::{CertificateError, TransportError};

/// Build a client connection for `server_name` trusting the platform roots.
pub(super) fn client_connection(
    server_name: &str,
    settings: &TlsSettings,
) -> Result<rustls::ClientConnection, TransportError> {
    let mut roots = rustls::RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!("failed to load a platform certificate: {}", error);
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!(added, ignored, "loaded platform root certificates");

    let builder = rustls::ClientConfig::builder().with_root_certificates(roots);

    let config = match &settings.certificate {
        Some(cert_path) => {
            let key_path = settings.key.as_deref().unwrap_or(cert_path);
            let certs = read_certs(cert_path)?;
            let key = read_key(key_path)?;
            builder.with_client_auth_cert(certs, key)?
        }
        None => builder.with_no_client_auth(),
    };

    let name = ServerName::try_from(server_name.to_owned())
        .map_err(|_| TransportError::InvalidServerName(server_name.to_owned()))?;

    Ok(rustls::ClientConnection::new(Arc::new(config), name)?)
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(CertificateError::BadCertificateFile.into());
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, TransportError> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| CertificateError::BadPrivateKey.into())
}
