//! PEM files on disk: the fixed file layout, loading the CA back in, and
//! writing freshly issued material.
//!
//! Writes go through a temporary file in the destination directory which is
//! synced and then renamed over the target, so readers never see a partially
//! written PEM block. There is no locking between concurrent runs; the last
//! writer wins.

use crate::cert_common::Issued;
use crate::error::{PkiError, Result};
use openssl::pkey::{Id, PKey};
use openssl::x509::X509;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const ROOT_CA_KEY_FILE: &str = "rootCA.key";
pub const ROOT_CA_CERT_FILE: &str = "rootCA.crt";
pub const SERVER_KEY_FILE: &str = "server.key";
pub const SERVER_CERT_FILE: &str = "server.crt";

#[cfg(unix)]
const CERT_FILE_MODE: u32 = 0o644;

/// Location of a private key file and its certificate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemPair {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

impl PemPair {
    /// `rootCA.key` / `rootCA.crt` inside `dir`
    pub fn root_ca(dir: impl AsRef<Path>) -> Self {
        Self {
            key_path: dir.as_ref().join(ROOT_CA_KEY_FILE),
            cert_path: dir.as_ref().join(ROOT_CA_CERT_FILE),
        }
    }

    /// `server.key` / `server.crt` inside `dir`
    pub fn server(dir: impl AsRef<Path>) -> Self {
        Self {
            key_path: dir.as_ref().join(SERVER_KEY_FILE),
            cert_path: dir.as_ref().join(SERVER_CERT_FILE),
        }
    }

    /// True if either file is already present.
    pub fn any_exists(&self) -> bool {
        self.key_path.exists() || self.cert_path.exists()
    }

    /// True only if both files are present.
    pub fn both_exist(&self) -> bool {
        self.key_path.exists() && self.cert_path.exists()
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| PkiError::LoadError {
        path: path.to_path_buf(),
        source,
    })
}

fn malformed(path: &Path, reason: impl Into<String>) -> PkiError {
    PkiError::MalformedInputError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Load a PEM certificate.
pub fn load_certificate(path: &Path) -> Result<X509> {
    let pem = read_input(path)?;
    X509::from_pem(&pem).map_err(|e| malformed(path, format!("not a PEM certificate: {}", e)))
}

/// Load the CA private key and certificate.
///
/// The key must be an RSA key and must belong to the certificate.
pub fn load_ca(paths: &PemPair) -> Result<Issued> {
    let key_pem = read_input(&paths.key_path)?;
    let certificate = load_certificate(&paths.cert_path)?;

    let private_key = PKey::private_key_from_pem(&key_pem).map_err(|e| {
        malformed(&paths.key_path, format!("not a PEM private key: {}", e))
    })?;
    if private_key.id() != Id::RSA {
        return Err(malformed(&paths.key_path, "not an RSA private key"));
    }

    let cert_public_key = certificate
        .public_key()
        .map_err(|e| malformed(&paths.cert_path, format!("unreadable public key: {}", e)))?;
    if !cert_public_key.public_eq(&private_key) {
        return Err(malformed(
            &paths.key_path,
            format!("key does not match {}", paths.cert_path.display()),
        ));
    }

    debug!(key = %paths.key_path.display(), cert = %paths.cert_path.display(), "loaded CA");
    Ok(Issued {
        private_key,
        certificate,
    })
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> PkiError + '_ {
    move |source| PkiError::FileIoError {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `contents` to a synced temporary file next to `target`.
fn stage(target: &Path, contents: &[u8], private: bool) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_error(dir))?;

    // tempfile creates the file with mode 0600
    let mut staged = tempfile::Builder::new()
        .prefix(".private-ca")
        .tempfile_in(dir)
        .map_err(write_error(target))?;
    staged.write_all(contents).map_err(write_error(target))?;
    staged.as_file().sync_all().map_err(write_error(target))?;

    if !private {
        make_world_readable(staged.path()).map_err(write_error(target))?;
    }

    Ok(staged)
}

#[cfg(unix)]
fn make_world_readable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(CERT_FILE_MODE))
}

#[cfg(not(unix))]
fn make_world_readable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn persist(staged: NamedTempFile, target: &Path) -> Result<()> {
    staged
        .persist(target)
        .map_err(|e| write_error(target)(e.error))?;
    Ok(())
}

/// Write an issued key and certificate to their PEM files.
///
/// Both files are staged before either is renamed into place; the key is
/// persisted first.
pub fn write_issued(issued: &Issued, paths: &PemPair) -> Result<()> {
    if paths.any_exists() {
        warn!(
            key = %paths.key_path.display(),
            cert = %paths.cert_path.display(),
            "overwriting existing files"
        );
    }

    let key_pem = issued.key_pem()?;
    let cert_pem = issued.cert_pem()?;

    let staged_key = stage(&paths.key_path, &key_pem, true)?;
    let staged_cert = stage(&paths.cert_path, &cert_pem, false)?;

    persist(staged_key, &paths.key_path)?;
    persist(staged_cert, &paths.cert_path)?;

    debug!(key = %paths.key_path.display(), cert = %paths.cert_path.display(), "wrote PEM files");
    Ok(())
}
