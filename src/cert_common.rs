//! Pieces shared by the root CA and server certificate builders.

use crate::error::{PkiError, Result};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::{BigNum, MsbOption};
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509Name, X509};

pub(crate) const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2

/// Serial historically stamped on the root CA.
pub const LEGACY_CA_SERIAL: u32 = 1000;
/// Serial historically stamped on the server certificate.
pub const LEGACY_SERVER_SERIAL: u32 = 1001;

const RANDOM_SERIAL_BITS: i32 = 128;

/// How a certificate gets its serial number.
///
/// Fixed serials collide as soon as a CA issues a second leaf, so `Random`
/// is the default and `Fixed` only reproduces the legacy 1000/1001 layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerialPolicy {
    #[default]
    Random,
    Fixed(u32),
}

impl From<Option<u32>> for SerialPolicy {
    fn from(serial: Option<u32>) -> Self {
        match serial {
            Some(n) => SerialPolicy::Fixed(n),
            None => SerialPolicy::Random,
        }
    }
}

impl SerialPolicy {
    pub fn to_asn1_integer(self) -> Result<Asn1Integer> {
        let serial = match self {
            SerialPolicy::Random => {
                let mut serial = BigNum::new().map_err(cert_err("Failed to allocate serial"))?;
                serial
                    .rand(RANDOM_SERIAL_BITS, MsbOption::MAYBE_ZERO, false)
                    .map_err(cert_err("Failed to generate random serial"))?;
                serial
            }
            SerialPolicy::Fixed(n) => {
                BigNum::from_u32(n).map_err(cert_err("Failed to create serial"))?
            }
        };
        serial
            .to_asn1_integer()
            .map_err(cert_err("Failed to encode serial"))
    }
}

/// A private key together with its certificate.
pub struct Issued {
    pub private_key: PKey<Private>,
    pub certificate: X509,
}

impl Issued {
    /// Private key as PKCS#8 PEM.
    pub fn key_pem(&self) -> Result<Vec<u8>> {
        self.private_key
            .private_key_to_pem_pkcs8()
            .map_err(cert_err("Failed to encode private key"))
    }

    pub fn cert_pem(&self) -> Result<Vec<u8>> {
        self.certificate
            .to_pem()
            .map_err(cert_err("Failed to encode certificate"))
    }
}

pub(crate) fn cert_err(context: &'static str) -> impl FnOnce(ErrorStack) -> PkiError {
    move |e| PkiError::CertificateError(format!("{}: {}", context, e))
}

pub(crate) fn generate_rsa_key(bits: u32) -> Result<PKey<Private>> {
    let rsa = Rsa::generate(bits).map_err(|e| {
        PkiError::KeyGenerationError(format!("Failed to generate {}-bit RSA keypair: {}", bits, e))
    })?;

    PKey::from_rsa(rsa)
        .map_err(|e| PkiError::KeyGenerationError(format!("Failed to create private key: {}", e)))
}

pub(crate) fn common_name(cn: &str) -> Result<X509Name> {
    let mut name_builder =
        X509Name::builder().map_err(cert_err("Failed to create name builder"))?;
    name_builder
        .append_entry_by_nid(Nid::COMMONNAME, cn)
        .map_err(cert_err("Failed to set CN"))?;
    Ok(name_builder.build())
}

/// Validity window starting now and lasting `days` days.
pub(crate) fn set_validity(builder: &mut X509Builder, days: u32) -> Result<()> {
    let not_before =
        Asn1Time::days_from_now(0).map_err(cert_err("Failed to create not_before"))?;
    builder
        .set_not_before(&not_before)
        .map_err(cert_err("Failed to set not_before"))?;

    let not_after =
        Asn1Time::days_from_now(days).map_err(cert_err("Failed to create not_after"))?;
    builder
        .set_not_after(&not_after)
        .map_err(cert_err("Failed to set not_after"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_serial() {
        let serial = SerialPolicy::Fixed(LEGACY_CA_SERIAL)
            .to_asn1_integer()
            .unwrap();
        let bn = serial.to_bn().unwrap();
        assert_eq!(bn, BigNum::from_u32(1000).unwrap());
    }

    #[test]
    fn test_random_serials_differ() {
        let a = SerialPolicy::Random.to_asn1_integer().unwrap().to_bn().unwrap();
        let b = SerialPolicy::Random.to_asn1_integer().unwrap().to_bn().unwrap();
        assert_ne!(a, b);
        assert!(a.num_bits() <= RANDOM_SERIAL_BITS);
    }

    #[test]
    fn test_serial_policy_from_option() {
        assert_eq!(SerialPolicy::from(None), SerialPolicy::Random);
        assert_eq!(SerialPolicy::from(Some(7)), SerialPolicy::Fixed(7));
    }

    #[test]
    fn test_common_name() {
        let name = common_name("My Private CA").unwrap();
        let cn = name.entries_by_nid(Nid::COMMONNAME).next().unwrap();
        assert_eq!(cn.data().as_utf8().unwrap().to_string(), "My Private CA");
    }

    #[test]
    fn test_generate_rsa_key_size() {
        let key = generate_rsa_key(2048).unwrap();
        assert_eq!(key.bits(), 2048);
        assert!(key.rsa().is_ok());
    }
}
