use crate::error::{PkiError, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when present.
pub const DEFAULT_CONFIG_PATH: &str = "private-ca.toml";

/// Smallest RSA modulus accepted for either key.
pub const MIN_RSA_KEY_BITS: u32 = 2048;

/// Longest validity accepted for either certificate (100 years).
pub const MAX_VALIDITY_DAYS: u32 = 36500;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub root_ca: RootCaConfig,
    #[serde(default)]
    pub server: ServerCertConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RootCaConfig {
    #[serde(default = "default_root_ca_cn")]
    pub common_name: String,
    #[serde(default = "default_root_ca_validity")]
    pub validity_days: u32,
    #[serde(default = "default_root_ca_key_bits")]
    pub key_bits: u32,
    /// Fixed serial number; a random 128-bit serial is used when unset.
    #[serde(default)]
    pub serial: Option<u32>,
}

impl Default for RootCaConfig {
    fn default() -> Self {
        Self {
            common_name: default_root_ca_cn(),
            validity_days: default_root_ca_validity(),
            key_bits: default_root_ca_key_bits(),
            serial: None,
        }
    }
}

fn default_root_ca_cn() -> String {
    "My Private CA".to_string()
}

fn default_root_ca_validity() -> u32 {
    3650 // 10 years
}

fn default_root_ca_key_bits() -> u32 {
    4096
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerCertConfig {
    #[serde(default = "default_server_cn")]
    pub common_name: String,
    #[serde(default = "default_server_validity")]
    pub validity_days: u32,
    #[serde(default = "default_server_key_bits")]
    pub key_bits: u32,
    #[serde(default = "default_san_dns")]
    pub san_dns: Vec<String>,
    #[serde(default = "default_san_ips")]
    pub san_ips: Vec<IpAddr>,
    #[serde(default)]
    pub serial: Option<u32>,
}

impl Default for ServerCertConfig {
    fn default() -> Self {
        Self {
            common_name: default_server_cn(),
            validity_days: default_server_validity(),
            key_bits: default_server_key_bits(),
            san_dns: default_san_dns(),
            san_ips: default_san_ips(),
            serial: None,
        }
    }
}

fn default_server_cn() -> String {
    "localhost".to_string()
}

fn default_server_validity() -> u32 {
    365
}

fn default_server_key_bits() -> u32 {
    2048
}

fn default_san_dns() -> Vec<String> {
    vec!["localhost".to_string()]
}

fn default_san_ips() -> Vec<IpAddr> {
    vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|e| {
            PkiError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&config_str)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(config_str)
            .map_err(|e| PkiError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `private-ca.toml` from the working directory, or fall back to defaults
    pub fn load_or_default() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_key_bits("root_ca", self.root_ca.key_bits)?;
        check_key_bits("server", self.server.key_bits)?;
        check_validity("root_ca", self.root_ca.validity_days)?;
        check_validity("server", self.server.validity_days)?;

        if self.root_ca.common_name.trim().is_empty() {
            return Err(PkiError::ConfigError(
                "root_ca.common_name cannot be empty".to_string(),
            ));
        }
        if self.server.common_name.trim().is_empty() {
            return Err(PkiError::ConfigError(
                "server.common_name cannot be empty".to_string(),
            ));
        }
        if self.server.san_dns.is_empty() && self.server.san_ips.is_empty() {
            return Err(PkiError::ConfigError(
                "server certificate needs at least one subjectAltName entry".to_string(),
            ));
        }
        if let Some(name) = self.server.san_dns.iter().find(|n| !is_dns_name(n)) {
            return Err(PkiError::ConfigError(format!(
                "invalid SAN DNS entry: {:?}",
                name
            )));
        }
        Ok(())
    }
}

impl ServerCertConfig {
    /// Fields that still carry template placeholder text such as `xxx.xx.xx.x`.
    pub fn placeholder_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if looks_like_placeholder(&self.common_name) {
            fields.push(format!("server.common_name = {:?}", self.common_name));
        }
        for name in &self.san_dns {
            if looks_like_placeholder(name) {
                fields.push(format!("server.san_dns = {:?}", name));
            }
        }
        fields
    }
}

fn check_key_bits(section: &str, bits: u32) -> Result<()> {
    if bits < MIN_RSA_KEY_BITS {
        return Err(PkiError::ConfigError(format!(
            "{}.key_bits must be at least {} (got {})",
            section, MIN_RSA_KEY_BITS, bits
        )));
    }
    Ok(())
}

fn check_validity(section: &str, days: u32) -> Result<()> {
    if days == 0 {
        return Err(PkiError::ConfigError(format!(
            "{}.validity_days must be greater than zero",
            section
        )));
    }
    if days > MAX_VALIDITY_DAYS {
        return Err(PkiError::ConfigError(format!(
            "{}.validity_days must be at most {} (got {})",
            section, MAX_VALIDITY_DAYS, days
        )));
    }
    Ok(())
}

/// Non-empty, with no whitespace, commas or colons.
fn is_dns_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == ',' || c == ':')
}

/// A value made only of `x` runs separated by dots, e.g. `xxx.xx.xx.x`.
pub fn looks_like_placeholder(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.split('.').all(|label| {
            !label.is_empty() && label.chars().all(|c| c.eq_ignore_ascii_case(&'x'))
        })
}
