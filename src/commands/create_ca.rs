use crate::configs::AppConfig;
use crate::generate_root_ca::RsaRootCABuilder;
use crate::pem_files::{write_issued, PemPair};
use anyhow::{Context, Result};
use tracing::info;

/// Handle the create-ca command
///
/// Generates a fresh root CA key and self-signed certificate and writes
/// `rootCA.key` / `rootCA.crt` into the configured output directory,
/// replacing any previous root CA there.
pub fn handle_create_ca(config: &AppConfig) -> Result<PemPair> {
    let root_config = &config.root_ca;
    let paths = PemPair::root_ca(&config.output.directory);

    info!(
        cn = %root_config.common_name,
        bits = root_config.key_bits,
        days = root_config.validity_days,
        "generating root CA"
    );
    let root = RsaRootCABuilder::from_config(root_config)
        .build()
        .context("Failed to generate Root CA")?;

    write_issued(&root, &paths).context("Failed to save Root CA")?;
    info!(
        key = %paths.key_path.display(),
        cert = %paths.cert_path.display(),
        "root CA written"
    );

    println!("✓ Root CA created successfully: rootCA.key, rootCA.crt");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pem_files::load_ca;

    #[test]
    fn test_handle_create_ca_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.output.directory = dir.path().to_path_buf();
        config.root_ca.key_bits = 2048;

        let paths = handle_create_ca(&config).unwrap();
        assert!(paths.both_exist());
        assert!(load_ca(&paths).is_ok());
    }
}
