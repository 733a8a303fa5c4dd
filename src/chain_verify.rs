//! Checking issued certificates against the root CA.

use crate::cert_common::cert_err;
use crate::error::{PkiError, Result};
use openssl::hash::MessageDigest;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509NameRef, X509Ref, X509StoreContext, X509};
use std::fmt;

/// True if `leaf` carries a valid signature made by `ca`'s key.
pub fn verify_signed_by(leaf: &X509Ref, ca: &X509Ref) -> Result<bool> {
    let ca_public_key = ca
        .public_key()
        .map_err(cert_err("Failed to read CA public key"))?;
    // A signature by some other key is reported as an error by some OpenSSL
    // versions rather than as `false`.
    Ok(leaf.verify(&ca_public_key).unwrap_or(false))
}

/// Verify `leaf` with `ca` as the only trust anchor.
///
/// Runs the full X.509 path validation: signature, issuer/subject linkage,
/// validity window and CA constraints.
pub fn verify_chain(ca: &X509Ref, leaf: &X509Ref) -> Result<()> {
    let mut store = X509StoreBuilder::new().map_err(cert_err("Failed to create X509 store"))?;
    store
        .add_cert(ca.to_owned())
        .map_err(cert_err("Failed to add CA to store"))?;
    let store = store.build();

    let intermediates: Stack<X509> = Stack::new().map_err(cert_err("Failed to create stack"))?;
    let mut context = X509StoreContext::new().map_err(cert_err("Failed to create store context"))?;

    let (verified, reason) = context
        .init(&store, leaf, &intermediates, |c| {
            let verified = c.verify_cert()?;
            Ok((verified, c.error().error_string().to_string()))
        })
        .map_err(cert_err("Failed to run chain verification"))?;

    if verified {
        Ok(())
    } else {
        Err(PkiError::CertificateError(format!(
            "Chain verification failed: {}",
            reason
        )))
    }
}

/// Human-readable facts about a certificate.
#[derive(Debug, Clone)]
pub struct CertSummary {
    pub subject: String,
    pub issuer: String,
    pub serial_hex: String,
    pub not_before: String,
    pub not_after: String,
    pub sha256_fingerprint: String,
}

impl CertSummary {
    pub fn from_cert(cert: &X509Ref) -> Result<Self> {
        let serial_hex = cert
            .serial_number()
            .to_bn()
            .and_then(|bn| bn.to_hex_str().map(|s| s.to_string()))
            .map_err(cert_err("Failed to read serial number"))?;
        let digest = cert
            .digest(MessageDigest::sha256())
            .map_err(cert_err("Failed to hash certificate"))?;

        Ok(Self {
            subject: name_to_string(cert.subject_name()),
            issuer: name_to_string(cert.issuer_name()),
            serial_hex,
            not_before: cert.not_before().to_string(),
            not_after: cert.not_after().to_string(),
            sha256_fingerprint: fingerprint(&digest),
        })
    }
}

impl fmt::Display for CertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Subject:     {}", self.subject)?;
        writeln!(f, "  Issuer:      {}", self.issuer)?;
        writeln!(f, "  Serial:      {}", self.serial_hex)?;
        writeln!(f, "  Not Before:  {}", self.not_before)?;
        writeln!(f, "  Not After:   {}", self.not_after)?;
        write!(f, "  SHA-256:     {}", self.sha256_fingerprint)
    }
}

fn name_to_string(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            let value = entry
                .data()
                .as_utf8()
                .map(|s| s.to_string())
                .unwrap_or_default();
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn fingerprint(digest: &[u8]) -> String {
    let hex = hex::encode_upper(digest);
    let mut out = String::with_capacity(hex.len() + hex.len() / 2);
    for (i, c) in hex.chars().enumerate() {
        if i > 0 && i % 2 == 0 {
            out.push(':');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_root_ca::RsaRootCABuilder;
    use crate::generate_server_cert::RsaServerCertBuilder;

    #[test]
    fn test_chain_verifies() {
        let root = RsaRootCABuilder::new().key_bits(2048).build().unwrap();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();

        assert!(verify_signed_by(&server.certificate, &root.certificate).unwrap());
        verify_chain(&root.certificate, &server.certificate).unwrap();
    }

    #[test]
    fn test_chain_rejects_foreign_ca() {
        let root = RsaRootCABuilder::new().key_bits(2048).build().unwrap();
        let other = RsaRootCABuilder::new()
            .subject_common_name("Other CA".to_string())
            .key_bits(2048)
            .build()
            .unwrap();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();

        assert!(!verify_signed_by(&server.certificate, &other.certificate).unwrap());
        assert!(verify_chain(&other.certificate, &server.certificate).is_err());
    }

    #[test]
    fn test_same_subject_different_key_rejected() {
        let root = RsaRootCABuilder::new().key_bits(2048).build().unwrap();
        let impostor = RsaRootCABuilder::new().key_bits(2048).build().unwrap();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();

        assert!(!verify_signed_by(&server.certificate, &impostor.certificate).unwrap());
        assert!(verify_chain(&impostor.certificate, &server.certificate).is_err());
    }

    #[test]
    fn test_summary() {
        let root = RsaRootCABuilder::new()
            .key_bits(2048)
            .serial(crate::cert_common::SerialPolicy::Fixed(1000))
            .build()
            .unwrap();
        let summary = CertSummary::from_cert(&root.certificate).unwrap();

        assert_eq!(summary.subject, "CN=My Private CA");
        assert_eq!(summary.issuer, summary.subject);
        assert_eq!(summary.serial_hex, "03E8");
        assert_eq!(summary.sha256_fingerprint.split(':').count(), 32);
        assert!(summary.to_string().contains("SHA-256:"));
    }

    #[test]
    fn test_fingerprint_format() {
        assert_eq!(fingerprint(&[0x0a, 0xff, 0x00]), "0A:FF:00");
        assert_eq!(fingerprint(&[0x7f]), "7F");
        assert_eq!(fingerprint(&[]), "");
    }
}
