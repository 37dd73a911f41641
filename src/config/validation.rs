//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: URLs parse, the module
//! address is a valid account address, timeouts are non-zero and the poll
//! interval fits inside the confirmation window. All problems are reported,
//! not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::blockchain::types::AccountAddress;
use crate::config::schema::VaultConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `chain.node_url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &VaultConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "chain.node_url", &config.chain.node_url);
    if config.chain.module_address.parse::<AccountAddress>().is_err() {
        errors.push(ValidationError::new(
            "chain.module_address",
            format!("'{}' is not an account address", config.chain.module_address),
        ));
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }

    let submitter = &config.submitter;
    if submitter.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "submitter.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if submitter.poll_interval_ms == 0 {
        errors.push(ValidationError::new("submitter.poll_interval_ms", "must be greater than 0"));
    } else if submitter.poll_interval_ms >= submitter.confirmation_timeout_secs.saturating_mul(1000) {
        errors.push(ValidationError::new(
            "submitter.poll_interval_ms",
            "must be shorter than the confirmation timeout",
        ));
    }
    if submitter.max_gas_amount == 0 {
        errors.push(ValidationError::new("submitter.max_gas_amount", "must be greater than 0"));
    }
    if submitter.expiration_secs == 0 {
        errors.push(ValidationError::new("submitter.expiration_secs", "must be greater than 0"));
    }

    check_url(&mut errors, "storage.api_url", &config.storage.api_url);
    check_url(&mut errors, "storage.gateway_url", &config.storage.gateway_url);
    if config.storage.project_id.is_some() != config.storage.project_secret.is_some() {
        errors.push(ValidationError::new(
            "storage.project_secret",
            "project_id and project_secret must be set together",
        ));
    }
    if config.storage.timeout_secs == 0 {
        errors.push(ValidationError::new("storage.timeout_secs", "must be greater than 0"));
    }

    if config.session.store_path.trim().is_empty() {
        errors.push(ValidationError::new("session.store_path", "must not be empty"));
    }
    if config.wallet.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("wallet.private_key_env", "must not be empty"));
    }

    let retries = &config.retries;
    if retries.enabled {
        if retries.max_attempts == 0 {
            errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
        }
        if retries.base_delay_ms > retries.max_delay_ms {
            errors.push(ValidationError::new(
                "retries.base_delay_ms",
                "must not exceed retries.max_delay_ms",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
