use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use ring::digest::{digest, SHA256};
use std::time::{Duration, SystemTime};
use tracing::info;
use wtransport::tls::{Certificate, CertificateChain, PrivateKey};
use wtransport::Identity;

// Browsers reject serverCertificateHashes entries whose certificate is
// valid for longer than 14 days
const CERT_VALIDITY: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Self-signed TLS identity generated at startup
pub struct ServerIdentity {
    /// The wtransport Identity containing certificate and key
    pub identity: Identity,
    /// Base64-encoded SHA-256 hash of the DER certificate (for browser pinning)
    pub cert_hash: String,
}

impl ServerIdentity {
    /// Generate a fresh self-signed certificate for the given hostnames
    pub fn generate(subject_alt_names: &[String]) -> Result<Self> {
        let mut params = CertificateParams::new(subject_alt_names.to_vec())
            .context("invalid certificate hostnames")?;

        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, "Wildmere Server");

        let now = SystemTime::now();
        params.not_before = now.into();
        params.not_after = (now + CERT_VALIDITY).into();

        let key_pair = KeyPair::generate().context("failed to generate TLS key pair")?;
        let cert = params
            .self_signed(&key_pair)
            .context("failed to self-sign certificate")?;

        let cert_der = cert.der().to_vec();
        let cert_hash = STANDARD.encode(digest(&SHA256, &cert_der).as_ref());

        let chain = CertificateChain::single(
            Certificate::from_der(cert_der).context("generated certificate was rejected")?,
        );
        let private_key = PrivateKey::from_der_pkcs8(key_pair.serialize_der());
        let identity = Identity::new(chain, private_key);

        Ok(Self {
            identity,
            cert_hash,
        })
    }

    pub fn log_cert_info(&self) {
        info!("Certificate hash: {}", self.cert_hash);
        info!(
            "Chrome flag: --ignore-certificate-errors-spki-list={}",
            self.cert_hash
        );
    }

    /// Get the certificate hash for client configuration
    pub fn get_cert_hash(&self) -> &str {
        &self.cert_hash
    }
}
