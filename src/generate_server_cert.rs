//! TLS Server Certificate Generation Module
//!
//! Issues a server certificate signed directly by the root CA:
//!
//! **Certificate Chain**: Root CA → Server Certificate
//!
//! The subject and public key travel through a certificate signing request
//! (CSR). The CSR is self-signed by the new server key to prove possession;
//! that signature is checked and then discarded, and the final certificate
//! is signed with the CA key.
//!
//! # X.509 Extensions
//! - **Subject Alternative Name (SAN)**, non-critical: the configured DNS
//!   names and IP addresses (default `localhost` and `127.0.0.1`)
//!
//! # Example
//! ```rust,no_run
//! use private_ca::generate_root_ca::RsaRootCABuilder;
//! use private_ca::generate_server_cert::RsaServerCertBuilder;
//! # fn example() -> private_ca::Result<()> {
//! let root = RsaRootCABuilder::new().build()?;
//! let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
//!     .subject_common_name("relay.lan".to_string())
//!     .san_dns(vec!["localhost".to_string(), "relay.lan".to_string()])
//!     .san_ips(vec!["192.168.1.20".parse().unwrap()])
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::cert_common::{
    cert_err, common_name, generate_rsa_key, set_validity, Issued, SerialPolicy, X509_VERSION_3,
};
use crate::configs::ServerCertConfig;
use crate::error::{PkiError, Result};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKeyRef, Private};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Ref, X509Req, X509};
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

const RSA_KEY_SIZE_DEFAULT: u32 = 2048;
const X509_REQ_VERSION_1: i32 = 0;

/// Build a CSR for `cn`, self-signed with `key` to prove possession.
pub fn build_csr(cn: &str, key: &PKeyRef<Private>) -> Result<X509Req> {
    let mut req = X509Req::builder().map_err(cert_err("Failed to create CSR builder"))?;
    req.set_version(X509_REQ_VERSION_1)
        .map_err(cert_err("Failed to set CSR version"))?;

    let name = common_name(cn)?;
    req.set_subject_name(&name)
        .map_err(cert_err("Failed to set CSR subject"))?;
    req.set_pubkey(key)
        .map_err(cert_err("Failed to set CSR public key"))?;
    req.sign(key, MessageDigest::sha256())
        .map_err(cert_err("Failed to sign CSR"))?;

    Ok(req.build())
}

/// Builder for an RSA server key and a certificate signed by the root CA
pub struct RsaServerCertBuilder<'a> {
    subject_common_name: String,
    san_dns: Vec<String>,
    san_ips: Vec<IpAddr>,
    validity_days: u32,
    key_bits: u32,
    serial: SerialPolicy,
    signing_key: &'a PKeyRef<Private>,
    signing_cert: &'a X509Ref,
}

impl<'a> RsaServerCertBuilder<'a> {
    /// Create a new server certificate builder
    ///
    /// # Arguments
    /// * `ca_key` - Root CA private key used to sign the server certificate
    /// * `ca_cert` - Root CA certificate (issuer information)
    pub fn new(ca_key: &'a PKeyRef<Private>, ca_cert: &'a X509Ref) -> Self {
        Self {
            subject_common_name: "localhost".to_string(),
            san_dns: vec!["localhost".to_string()],
            san_ips: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            validity_days: 365,
            key_bits: RSA_KEY_SIZE_DEFAULT,
            serial: SerialPolicy::Random,
            signing_key: ca_key,
            signing_cert: ca_cert,
        }
    }

    /// Builder preloaded from the `[server]` configuration section
    pub fn from_config(
        config: &ServerCertConfig,
        ca_key: &'a PKeyRef<Private>,
        ca_cert: &'a X509Ref,
    ) -> Self {
        Self::new(ca_key, ca_cert)
            .subject_common_name(config.common_name.clone())
            .san_dns(config.san_dns.clone())
            .san_ips(config.san_ips.clone())
            .validity_days(config.validity_days)
            .key_bits(config.key_bits)
            .serial(SerialPolicy::from(config.serial))
    }

    /// Set the common name (CN), normally the server's hostname or address
    pub fn subject_common_name(mut self, cn: String) -> Self {
        self.subject_common_name = cn;
        self
    }

    pub fn san_dns(mut self, names: Vec<String>) -> Self {
        self.san_dns = names;
        self
    }

    pub fn san_ips(mut self, ips: Vec<IpAddr>) -> Self {
        self.san_ips = ips;
        self
    }

    /// Set validity period in days (default: 365)
    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    pub fn serial(mut self, serial: SerialPolicy) -> Self {
        self.serial = serial;
        self
    }

    /// Build the server key pair and CA-signed certificate
    ///
    /// # Certificate Properties
    /// - **Version**: X.509v3
    /// - **Signature Algorithm**: SHA-256 with RSA, signed by the CA key
    /// - **Subject / Public Key**: taken from the CSR
    /// - **Issuer**: the CA certificate's subject
    /// - **Subject Alternative Name**: configured DNS names and IPs
    pub fn build(self) -> Result<Issued> {
        debug!(bits = self.key_bits, cn = %self.subject_common_name, "generating server key");
        let private_key = generate_rsa_key(self.key_bits)?;

        let csr = build_csr(&self.subject_common_name, &private_key)?;
        let csr_public_key = csr
            .public_key()
            .map_err(cert_err("Failed to read CSR public key"))?;
        if !csr
            .verify(&csr_public_key)
            .map_err(cert_err("Failed to verify CSR"))?
        {
            return Err(PkiError::CertificateError(
                "CSR signature does not match its public key".to_string(),
            ));
        }

        let mut builder = X509::builder().map_err(cert_err("Failed to create X509 builder"))?;

        builder
            .set_version(X509_VERSION_3)
            .map_err(cert_err("Failed to set version"))?;

        let serial = self.serial.to_asn1_integer()?;
        builder
            .set_serial_number(&serial)
            .map_err(cert_err("Failed to set serial number"))?;

        builder
            .set_subject_name(csr.subject_name())
            .map_err(cert_err("Failed to set subject"))?;

        // Issuer is the root CA's subject
        builder
            .set_issuer_name(self.signing_cert.subject_name())
            .map_err(cert_err("Failed to set issuer from root CA"))?;

        set_validity(&mut builder, self.validity_days)?;

        builder
            .set_pubkey(&csr_public_key)
            .map_err(cert_err("Failed to set public key"))?;

        let mut san = SubjectAlternativeName::new();
        for name in &self.san_dns {
            san.dns(name);
        }
        for ip in &self.san_ips {
            san.ip(&ip.to_string());
        }
        let san = san
            .build(&builder.x509v3_context(Some(self.signing_cert), None))
            .map_err(cert_err("Failed to build SubjectAlternativeName"))?;
        builder
            .append_extension(san)
            .map_err(cert_err("Failed to add SubjectAlternativeName"))?;

        // Sign with the CA's private key, not the server's
        builder
            .sign(self.signing_key, MessageDigest::sha256())
            .map_err(cert_err("Failed to sign certificate"))?;

        Ok(Issued {
            private_key,
            certificate: builder.build(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert_common::LEGACY_SERVER_SERIAL;
    use crate::generate_root_ca::RsaRootCABuilder;
    use openssl::bn::BigNum;
    use openssl::nid::Nid;

    fn test_root() -> Issued {
        RsaRootCABuilder::new()
            .subject_common_name("Test Root CA".to_string())
            .key_bits(2048)
            .build()
            .unwrap()
    }

    #[test]
    fn test_server_cert_issuer_is_ca_subject() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();

        assert_eq!(
            server.certificate.issuer_name().to_der().unwrap(),
            root.certificate.subject_name().to_der().unwrap()
        );
    }

    #[test]
    fn test_server_cert_embeds_server_public_key() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();
        let embedded = server.certificate.public_key().unwrap();

        assert!(embedded.public_eq(&server.private_key));
        assert!(!embedded.public_eq(&root.private_key));
        assert_eq!(server.private_key.bits(), 2048);
    }

    #[test]
    fn test_server_cert_validity_window() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();
        let diff = server
            .certificate
            .not_before()
            .diff(server.certificate.not_after())
            .unwrap();

        assert_eq!(diff.days, 365);
        assert!(diff.secs.abs() < 60);
    }

    #[test]
    fn test_server_cert_signed_by_ca_only() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();
        let ca_public = root.certificate.public_key().unwrap();

        assert!(server.certificate.verify(&ca_public).unwrap());
        assert!(!server
            .certificate
            .verify(&server.private_key)
            .unwrap_or(false));

        let other = test_root();
        assert!(!server
            .certificate
            .verify(&other.private_key)
            .unwrap_or(false));
    }

    #[test]
    fn test_server_cert_san_entries() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .san_dns(vec!["localhost".to_string(), "relay.lan".to_string()])
            .san_ips(vec!["192.168.1.20".parse().unwrap(), "::1".parse().unwrap()])
            .build()
            .unwrap();

        let names = server.certificate.subject_alt_names().unwrap();
        let dns: Vec<&str> = names.iter().filter_map(|n| n.dnsname()).collect();
        let ips: Vec<&[u8]> = names.iter().filter_map(|n| n.ipaddress()).collect();

        assert_eq!(dns, vec!["localhost", "relay.lan"]);
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0], &[192, 168, 1, 20]);
        assert_eq!(ips[1].len(), 16);

        let text = String::from_utf8(server.certificate.to_text().unwrap()).unwrap();
        assert!(text.contains("X509v3 Subject Alternative Name:"));
        assert!(!text.contains("X509v3 Subject Alternative Name: critical"));
    }

    #[test]
    fn test_server_cert_subject_from_csr() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .subject_common_name("relay.lan".to_string())
            .build()
            .unwrap();

        let cn = server
            .certificate
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap();
        assert_eq!(cn.data().as_utf8().unwrap().to_string(), "relay.lan");
        assert_eq!(server.certificate.version(), X509_VERSION_3);
    }

    #[test]
    fn test_server_cert_fixed_serial() {
        let root = test_root();
        let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .serial(SerialPolicy::Fixed(LEGACY_SERVER_SERIAL))
            .build()
            .unwrap();
        let serial = server.certificate.serial_number().to_bn().unwrap();
        assert_eq!(serial, BigNum::from_u32(1001).unwrap());
    }

    #[test]
    fn test_multiple_leaves_get_distinct_serials() {
        let root = test_root();
        let first = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();
        let second = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
            .build()
            .unwrap();

        assert_ne!(
            first.certificate.serial_number().to_bn().unwrap(),
            second.certificate.serial_number().to_bn().unwrap()
        );
    }

    #[test]
    fn test_build_csr_is_self_signed() {
        let key = generate_rsa_key(2048).unwrap();
        let csr = build_csr("relay.lan", &key).unwrap();

        assert!(csr.verify(&key).unwrap());
        assert!(csr.public_key().unwrap().public_eq(&key));
    }
}
