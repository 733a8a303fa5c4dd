//! private-ca CLI
//!
//! Bootstraps a private root CA and issues server certificates signed by it.
//! Settings come from `private-ca.toml` (or `--config`) and can be
//! overridden per command.

use anyhow::Result;
use clap::{Parser, Subcommand};
use private_ca::cert_common::{LEGACY_CA_SERIAL, LEGACY_SERVER_SERIAL};
use private_ca::commands::create_ca::handle_create_ca;
use private_ca::commands::init_tracing;
use private_ca::commands::issue_server::handle_issue_server;
use private_ca::commands::verify::handle_verify;
use private_ca::configs::AppConfig;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "private-ca")]
#[command(about = "Create a private root CA and issue server certificates", long_about = None)]
struct Cli {
    /// Configuration file (default: private-ca.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding rootCA.* and server.* (overrides [output].directory)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Use the fixed legacy serial numbers (1000 for the CA, 1001 for the server)
    #[arg(long, global = true)]
    legacy_serials: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate rootCA.key and the self-signed rootCA.crt
    CreateCa {
        /// Subject common name
        #[arg(long)]
        common_name: Option<String>,

        /// Validity in days
        #[arg(long)]
        validity_days: Option<u32>,

        /// RSA key size in bits
        #[arg(long)]
        key_bits: Option<u32>,

        /// Fixed serial number (random when omitted)
        #[arg(long)]
        serial: Option<u32>,
    },

    /// Issue server.key and server.crt signed by the root CA
    IssueServer {
        /// Subject common name
        #[arg(long)]
        common_name: Option<String>,

        /// subjectAltName DNS entry (repeatable; replaces the configured list)
        #[arg(long = "dns")]
        dns: Vec<String>,

        /// subjectAltName IP entry (repeatable; replaces the configured list)
        #[arg(long = "ip")]
        ips: Vec<IpAddr>,

        /// Validity in days
        #[arg(long)]
        validity_days: Option<u32>,

        /// RSA key size in bits
        #[arg(long)]
        key_bits: Option<u32>,

        /// Fixed serial number (random when omitted)
        #[arg(long)]
        serial: Option<u32>,
    },

    /// Check that server.crt chains to rootCA.crt
    Verify,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load_or_default()?,
    };
    if let Some(dir) = cli.out_dir {
        config.output.directory = dir;
    }
    if cli.legacy_serials {
        config.root_ca.serial = Some(LEGACY_CA_SERIAL);
        config.server.serial = Some(LEGACY_SERVER_SERIAL);
    }

    match cli.command {
        Commands::CreateCa {
            common_name,
            validity_days,
            key_bits,
            serial,
        } => {
            let root = &mut config.root_ca;
            if let Some(cn) = common_name {
                root.common_name = cn;
            }
            if let Some(days) = validity_days {
                root.validity_days = days;
            }
            if let Some(bits) = key_bits {
                root.key_bits = bits;
            }
            if serial.is_some() {
                root.serial = serial;
            }
            config.validate()?;
            handle_create_ca(&config)?;
        }

        Commands::IssueServer {
            common_name,
            dns,
            ips,
            validity_days,
            key_bits,
            serial,
        } => {
            let server = &mut config.server;
            if let Some(cn) = common_name {
                server.common_name = cn;
            }
            if !dns.is_empty() {
                server.san_dns = dns;
            }
            if !ips.is_empty() {
                server.san_ips = ips;
            }
            if let Some(days) = validity_days {
                server.validity_days = days;
            }
            if let Some(bits) = key_bits {
                server.key_bits = bits;
            }
            if serial.is_some() {
                server.serial = serial;
            }
            config.validate()?;
            handle_issue_server(&config)?;
        }

        Commands::Verify => handle_verify(&config)?,
    }

    Ok(())
}
