//! Root CA Certificate Generation Module
//!
//! Generates the self-signed root certificate authority that every server
//! certificate issued by this crate chains back to.
//!
//! # Certificate Properties
//! - **Self-signed**: Issuer and subject are the same
//! - **Basic Constraints**: CA=true, pathlen=0, critical
//! - **Key Usage**: keyCertSign, cRLSign, critical
//! - **Subject Key Identifier**: hash of the public key
//! - **Default Key Size**: RSA 4096-bit
//! - **Default Validity**: 3650 days
//! - **Version**: X.509v3
//!
//! # Example
//! ```rust,no_run
//! use private_ca::generate_root_ca::RsaRootCABuilder;
//! # fn example() -> private_ca::Result<()> {
//! let root = RsaRootCABuilder::new()
//!     .subject_common_name("My Private CA".to_string())
//!     .validity_days(3650)
//!     .build()?;
//! let pem = root.cert_pem()?;
//! # Ok(())
//! # }
//! ```

use crate::cert_common::{
    cert_err, common_name, generate_rsa_key, set_validity, Issued, SerialPolicy, X509_VERSION_3,
};
use crate::configs::RootCaConfig;
use crate::error::Result;
use openssl::hash::MessageDigest;
use openssl::x509::extension::{BasicConstraints, KeyUsage, SubjectKeyIdentifier};
use openssl::x509::X509;
use tracing::debug;

const RSA_KEY_SIZE_DEFAULT: u32 = 4096;
const ROOT_CA_PATH_LENGTH: u32 = 0;

/// Builder for the RSA key pair and self-signed root CA certificate
///
/// The root allows exactly one level below it (`pathlen=0`): it signs leaf
/// certificates directly and never an intermediate CA.
pub struct RsaRootCABuilder {
    subject_common_name: String,
    validity_days: u32,
    key_bits: u32,
    serial: SerialPolicy,
}

impl Default for RsaRootCABuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RsaRootCABuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            subject_common_name: "My Private CA".to_string(),
            validity_days: 3650,
            key_bits: RSA_KEY_SIZE_DEFAULT,
            serial: SerialPolicy::Random,
        }
    }

    /// Builder preloaded from the `[root_ca]` configuration section
    pub fn from_config(config: &RootCaConfig) -> Self {
        Self::new()
            .subject_common_name(config.common_name.clone())
            .validity_days(config.validity_days)
            .key_bits(config.key_bits)
            .serial(SerialPolicy::from(config.serial))
    }

    /// Set the common name (CN) for the certificate
    pub fn subject_common_name(mut self, cn: String) -> Self {
        self.subject_common_name = cn;
        self
    }

    /// Set validity period in days
    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Set the RSA modulus size in bits
    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    pub fn serial(mut self, serial: SerialPolicy) -> Self {
        self.serial = serial;
        self
    }

    /// Build the RSA key pair and self-signed root CA certificate
    ///
    /// # Errors
    /// Returns `KeyGenerationError` if RSA key generation fails and
    /// `CertificateError` if any X.509 field, extension or the signature
    /// cannot be produced.
    pub fn build(self) -> Result<Issued> {
        debug!(bits = self.key_bits, "generating root CA key");
        let private_key = generate_rsa_key(self.key_bits)?;

        let mut builder = X509::builder().map_err(cert_err("Failed to create X509 builder"))?;

        builder
            .set_version(X509_VERSION_3)
            .map_err(cert_err("Failed to set version"))?;

        let serial = self.serial.to_asn1_integer()?;
        builder
            .set_serial_number(&serial)
            .map_err(cert_err("Failed to set serial number"))?;

        let name = common_name(&self.subject_common_name)?;
        builder
            .set_subject_name(&name)
            .map_err(cert_err("Failed to set subject"))?;
        builder
            .set_issuer_name(&name)
            .map_err(cert_err("Failed to set issuer"))?;

        set_validity(&mut builder, self.validity_days)?;

        builder
            .set_pubkey(&private_key)
            .map_err(cert_err("Failed to set public key"))?;

        let bc = BasicConstraints::new()
            .critical()
            .ca()
            .pathlen(ROOT_CA_PATH_LENGTH)
            .build()
            .map_err(cert_err("Failed to build BasicConstraints"))?;
        builder
            .append_extension(bc)
            .map_err(cert_err("Failed to add BasicConstraints"))?;

        let ku = KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()
            .map_err(cert_err("Failed to build KeyUsage"))?;
        builder
            .append_extension(ku)
            .map_err(cert_err("Failed to add KeyUsage"))?;

        // Needs the public key in place: the identifier is its SHA-1 hash.
        let ski = SubjectKeyIdentifier::new()
            .build(&builder.x509v3_context(None, None))
            .map_err(cert_err("Failed to build SubjectKeyIdentifier"))?;
        builder
            .append_extension(ski)
            .map_err(cert_err("Failed to add SubjectKeyIdentifier"))?;

        builder
            .sign(&private_key, MessageDigest::sha256())
            .map_err(cert_err("Failed to sign certificate"))?;

        Ok(Issued {
            private_key,
            certificate: builder.build(),
        })
    }
}
