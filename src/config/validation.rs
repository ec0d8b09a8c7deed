//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses and URLs parse, network ids are unique
//! - Validate value ranges (timeouts > 0, jitter in range, decimals representable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TokenConfig → Result<(), Vec<ValidationError>>

use alloy::primitives::Address;
use std::collections::HashSet;
use std::fmt;

use crate::config::schema::TokenConfig;
use crate::token::units::MAX_DECIMALS;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TokenConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();

    for (i, network) in config.networks.iter().enumerate() {
        let prefix = format!("networks[{}]", i);

        if network.id.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.id", prefix), "must not be empty"));
        } else if !seen_ids.insert(network.id.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.id", prefix),
                format!("duplicate network id '{}'", network.id),
            ));
        }

        if network.rpc_url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                format!("{}.rpc_url", prefix),
                format!("invalid URL '{}'", network.rpc_url),
            ));
        }

        for (j, failover) in network.failover_urls.iter().enumerate() {
            if failover.parse::<url::Url>().is_err() {
                errors.push(ValidationError::new(
                    format!("{}.failover_urls[{}]", prefix, j),
                    format!("invalid URL '{}'", failover),
                ));
            }
        }

        check_address(&mut errors, format!("{}.token_address", prefix), &network.token_address);
        if let Some(sender) = &network.sender {
            check_address(&mut errors, format!("{}.sender", prefix), sender);
        }
        if let Some(supplier) = &network.supplier {
            check_address(&mut errors, format!("{}.supplier", prefix), supplier);
        }
        for (j, owner) in network.owner_whitelist.iter().enumerate() {
            check_address(&mut errors, format!("{}.owner_whitelist[{}]", prefix, j), owner);
        }

        if network.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new(
                format!("{}.rpc_timeout_secs", prefix),
                "must be greater than zero",
            ));
        }

        if network.private_key_env.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{}.private_key_env", prefix),
                "must name an environment variable",
            ));
        }
    }

    if config.confirmation.poll_base_delay_ms == 0 {
        errors.push(ValidationError::new(
            "confirmation.poll_base_delay_ms",
            "must be greater than zero",
        ));
    }
    if config.confirmation.poll_ceiling_secs == 0 {
        errors.push(ValidationError::new(
            "confirmation.poll_ceiling_secs",
            "must be greater than zero",
        ));
    }

    if config.retries.max_wait_ms == 0 {
        errors.push(ValidationError::new("retries.max_wait_ms", "must be greater than zero"));
    }
    if !(0.0..1.0).contains(&config.retries.jitter) {
        errors.push(ValidationError::new(
            "retries.jitter",
            format!("must be in [0, 1), got {}", config.retries.jitter),
        ));
    }

    if config.units.decimals > MAX_DECIMALS {
        errors.push(ValidationError::new(
            "units.decimals",
            format!("must be at most {}, got {}", MAX_DECIMALS, config.units.decimals),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: String, value: &str) {
    if value.parse::<Address>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid address '{}'", value)));
    }
}
