//! TLS certificate material and acceptor construction
//!
//! The server always speaks TLS. On first start a self-signed certificate is
//! generated next to the workspace; operators pin its fingerprint on the
//! client side.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;

use crate::constants::{
    CERT_FILENAME, KEY_FILENAME, MSG_CERT_FINGERPRINT, MSG_CERT_GENERATED, MSG_GENERATING_CERT,
    MSG_KEY_GENERATED, TLS_CERT_COMMON_NAME,
};

/// Certificate and key file locations for one server instance
pub struct CertPaths {
    cert: PathBuf,
    key: PathBuf,
}

impl CertPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cert: dir.join(CERT_FILENAME),
            key: dir.join(KEY_FILENAME),
        }
    }

    fn exist(&self) -> bool {
        self.cert.exists() && self.key.exists()
    }
}

/// Build a TLS acceptor, generating certificate material on first start
///
/// Prints the certificate's SHA-256 fingerprint either way so the operator
/// can pin it client-side.
pub fn build_acceptor(paths: &CertPaths) -> Result<TlsAcceptor, String> {
    if !paths.exist() {
        println!("{}", MSG_GENERATING_CERT);
        generate_material(paths)?;
    }

    let acceptor = acceptor_from_files(paths)?;
    println!("{}{}", MSG_CERT_FINGERPRINT, fingerprint(&paths.cert)?);
    Ok(acceptor)
}

/// Generate a self-signed certificate and key and write both as PEM
fn generate_material(paths: &CertPaths) -> Result<(), String> {
    use rcgen::{CertificateParams, DnType, KeyPair};

    let key_pair = KeyPair::generate().map_err(|e| format!("key generation failed: {e}"))?;

    let mut params = CertificateParams::new(vec![])
        .map_err(|e| format!("certificate parameters rejected: {e}"))?;
    params
        .distinguished_name
        .push(DnType::CommonName, TLS_CERT_COMMON_NAME);
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| format!("self-signing failed: {e}"))?;

    write_pem(&paths.cert, &cert.pem())?;
    write_pem(&paths.key, &key_pair.serialize_pem())?;

    println!("{}{}", MSG_CERT_GENERATED, paths.cert.display());
    println!("{}{}", MSG_KEY_GENERATED, paths.key.display());
    Ok(())
}

/// Write a PEM file readable only by the owner (on Unix)
fn write_pem(path: &Path, contents: &str) -> Result<(), String> {
    fs::write(path, contents)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| format!("failed to restrict {}: {e}", path.display()))?;
    }

    Ok(())
}

/// Load the certificate chain and key from disk into a rustls acceptor
fn acceptor_from_files(paths: &CertPaths) -> Result<TlsAcceptor, String> {
    let mut cert_reader = open_reader(&paths.cert)?;
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("failed to parse certificate: {e}"))?;
    if certs.is_empty() {
        return Err(format!("no certificates in {}", paths.cert.display()));
    }

    let mut key_reader = open_reader(&paths.key)?;
    let key = rustls_pemfile::private_key(&mut key_reader)
        .map_err(|e| format!("failed to parse private key: {e}"))?
        .ok_or_else(|| format!("no private key in {}", paths.key.display()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| format!("TLS configuration rejected: {e}"))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn open_reader(path: &Path) -> Result<BufReader<fs::File>, String> {
    let file =
        fs::File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    Ok(BufReader::new(file))
}

/// SHA-256 fingerprint of the DER certificate, as colon-separated hex
fn fingerprint(cert_path: &Path) -> Result<String, String> {
    let pem_text = fs::read_to_string(cert_path)
        .map_err(|e| format!("failed to read {}: {e}", cert_path.display()))?;
    let der = pem::parse(&pem_text).map_err(|e| format!("failed to parse certificate: {e}"))?;

    let digest = Sha256::digest(der.contents());
    let parts: Vec<String> = digest.iter().map(|b| hex::encode_upper([*b])).collect();
    Ok(parts.join(":"))
}
