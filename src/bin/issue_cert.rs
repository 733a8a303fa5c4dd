//! Issue `server.key` / `server.crt` signed by the root CA in the working
//! directory.
//!
//! Reads `private-ca.toml` when present; takes no arguments.

use anyhow::Result;
use private_ca::commands::{init_tracing, issue_server::handle_issue_server};
use private_ca::configs::AppConfig;

fn main() -> Result<()> {
    init_tracing();
    let config = AppConfig::load_or_default()?;
    handle_issue_server(&config)?;
    Ok(())
}
