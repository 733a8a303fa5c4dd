//! private-ca - a two-step private PKI
//!
//! Creates a self-signed root certificate authority and issues TLS server
//! certificates signed by it. RSA key generation, X.509 encoding and
//! SHA-256 signing are done by OpenSSL; this crate owns the certificate
//! profile, the on-disk layout and the failure behavior.
//!
//! # Overview
//!
//! ```text
//! Root CA (self-signed, CA:TRUE, pathlen=0)  -> rootCA.key, rootCA.crt
//!   └── Server certificate (signed by Root)  -> server.key, server.crt
//! ```
//!
//! The two workflows share nothing but the filesystem. Creating the CA
//! needs no input; issuing a server certificate needs `rootCA.key` and
//! `rootCA.crt` and fails before writing anything if they cannot be loaded.
//!
//! # Binaries
//!
//! - `create-ca` / `issue-cert`: no arguments, read `private-ca.toml` from the
//!   working directory when present
//! - `private-ca`: `create-ca`, `issue-server` and `verify` subcommands with
//!   per-command overrides
//!
//! # Example
//!
//! ```no_run
//! use private_ca::generate_root_ca::RsaRootCABuilder;
//! use private_ca::generate_server_cert::RsaServerCertBuilder;
//! use private_ca::pem_files::{write_issued, PemPair};
//!
//! fn main() -> private_ca::Result<()> {
//!     let root = RsaRootCABuilder::new()
//!         .subject_common_name("My Private CA".to_string())
//!         .validity_days(3650)
//!         .build()?;
//!     write_issued(&root, &PemPair::root_ca("."))?;
//!
//!     let server = RsaServerCertBuilder::new(&root.private_key, &root.certificate)
//!         .subject_common_name("relay.lan".to_string())
//!         .san_dns(vec!["localhost".to_string(), "relay.lan".to_string()])
//!         .build()?;
//!     write_issued(&server, &PemPair::server("."))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Library functions return [`Result`] with a [`PkiError`]; nothing is
//! retried and files already written are left in place. The binaries wrap
//! these in `anyhow` context and exit nonzero.

pub mod cert_common;
pub mod chain_verify;
pub mod commands;
pub mod configs;
pub mod error;
pub mod generate_root_ca;
pub mod generate_server_cert;
pub mod pem_files;

pub use error::{PkiError, Result};
