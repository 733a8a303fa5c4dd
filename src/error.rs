//! Error types for private CA operations.
//!
//! Every workflow aborts on the first error; nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for CA bootstrap and leaf issuance.
#[derive(Error, Debug)]
pub enum PkiError {
    /// RSA key generation failed
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// A required input file is missing or unreadable
    #[error("Failed to load {}: {source}", path.display())]
    LoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file exists but does not hold what it should
    #[error("Malformed input {}: {reason}", path.display())]
    MalformedInputError { path: PathBuf, reason: String },

    /// Writing an output file failed
    #[error("Failed to write {}: {source}", path.display())]
    FileIoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building, signing or encoding a certificate failed
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PkiError {
    /// True for errors raised while reading the CA inputs.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            PkiError::LoadError { .. } | PkiError::MalformedInputError { .. }
        )
    }
}

/// A specialized Result type for private CA operations.
pub type Result<T> = std::result::Result<T, PkiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PkiError::MalformedInputError {
            path: PathBuf::from("rootCA.crt"),
            reason: "not a certificate".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed input rootCA.crt: not a certificate"
        );
    }

    #[test]
    fn test_load_error_classification() {
        let err = PkiError::LoadError {
            path: PathBuf::from("rootCA.key"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_load_error());
        assert!(!PkiError::ConfigError("bad".to_string()).is_load_error());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PkiError>();
    }
}
