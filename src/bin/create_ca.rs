//! Create the root CA (`rootCA.key`, `rootCA.crt`) in the working directory.
//!
//! Reads `private-ca.toml` when present; takes no arguments.

use anyhow::Result;
use private_ca::commands::{create_ca::handle_create_ca, init_tracing};
use private_ca::configs::AppConfig;

fn main() -> Result<()> {
    init_tracing();
    let config = AppConfig::load_or_default()?;
    handle_create_ca(&config)?;
    Ok(())
}
