use crate::configs::AppConfig;
use crate::generate_server_cert::RsaServerCertBuilder;
use crate::pem_files::{load_ca, write_issued, PemPair};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Handle the issue-server command
///
/// Loads `rootCA.key` / `rootCA.crt` from the output directory, issues a
/// server certificate signed by that CA and writes `server.key` /
/// `server.crt` next to them. Nothing is written if the CA cannot be loaded.
pub fn handle_issue_server(config: &AppConfig) -> Result<PemPair> {
    let server_config = &config.server;
    let ca_paths = PemPair::root_ca(&config.output.directory);
    let paths = PemPair::server(&config.output.directory);

    let ca = load_ca(&ca_paths).context("Failed to load Root CA")?;

    for field in server_config.placeholder_fields() {
        warn!("placeholder value left unchanged: {}", field);
    }

    info!(
        cn = %server_config.common_name,
        dns = ?server_config.san_dns,
        ips = ?server_config.san_ips,
        days = server_config.validity_days,
        "issuing server certificate"
    );
    let server = RsaServerCertBuilder::from_config(server_config, &ca.private_key, &ca.certificate)
        .build()
        .context("Failed to generate server certificate")?;

    write_issued(&server, &paths).context("Failed to save server certificate")?;
    info!(
        key = %paths.key_path.display(),
        cert = %paths.cert_path.display(),
        "server certificate written"
    );

    println!("✓ Server certificate created successfully: server.key, server.crt");
    Ok(paths)
}
