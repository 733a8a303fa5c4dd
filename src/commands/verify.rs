use crate::chain_verify::{verify_chain, CertSummary};
use crate::configs::AppConfig;
use crate::pem_files::{load_certificate, PemPair};
use anyhow::{Context, Result};
use tracing::info;

/// Handle the verify command
///
/// Checks `server.crt` against `rootCA.crt` and prints both certificates.
pub fn handle_verify(config: &AppConfig) -> Result<()> {
    let ca_paths = PemPair::root_ca(&config.output.directory);
    let server_paths = PemPair::server(&config.output.directory);

    let ca_cert = load_certificate(&ca_paths.cert_path).context("Failed to load Root CA")?;
    let server_cert =
        load_certificate(&server_paths.cert_path).context("Failed to load server certificate")?;

    println!("Root CA ({}):", ca_paths.cert_path.display());
    println!("{}", CertSummary::from_cert(&ca_cert)?);
    println!("\nServer ({}):", server_paths.cert_path.display());
    println!("{}", CertSummary::from_cert(&server_cert)?);

    verify_chain(&ca_cert, &server_cert).context("server.crt does not chain to rootCA.crt")?;
    info!("chain verified");

    println!("\n✓ server.crt chains to rootCA.crt");
    Ok(())
}
