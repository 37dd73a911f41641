//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::VaultConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the chain node endpoint.
pub const NODE_URL_ENV_VAR: &str = "CURAVAULT_NODE_URL";
/// Overrides the IPFS basic-auth user.
pub const IPFS_PROJECT_ID_ENV_VAR: &str = "CURAVAULT_IPFS_PROJECT_ID";
/// Overrides the IPFS basic-auth secret.
pub const IPFS_PROJECT_SECRET_ENV_VAR: &str = "CURAVAULT_IPFS_PROJECT_SECRET";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are ignored.
pub fn apply_overrides<F>(config: &mut VaultConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(NODE_URL_ENV_VAR) {
        config.chain.node_url = url;
    }
    if let Some(id) = get(IPFS_PROJECT_ID_ENV_VAR) {
        config.storage.project_id = Some(id);
    }
    if let Some(secret) = get(IPFS_PROJECT_SECRET_ENV_VAR) {
        config.storage.project_secret = Some(secret);
    }
}

fn finish(mut config: VaultConfig) -> Result<VaultConfig, ConfigError> {
    apply_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<VaultConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: VaultConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    finish(config)
}

/// Load from `path` if given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<VaultConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(VaultConfig::default()),
    }
}
