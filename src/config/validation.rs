//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits and timeouts > 0, port range ordered)
//! - Reject patterns that would leave filtering undefined
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FastDlConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use regex::Regex;
use thiserror::Error;

use crate::config::schema::FastDlConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("forbidden pattern {pattern:?} does not compile: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("rate limit #{index} must have a limit greater than zero")]
    ZeroRateLimit { index: usize },

    #[error("rate limit #{index} must have a period greater than zero")]
    ZeroRatePeriod { index: usize },

    #[error("port range {range:?} must look like \"low-high\" with low <= high")]
    InvalidPortRange { range: String },

    #[error("admin API is enabled but no api_key is set")]
    MissingAdminKey,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

pub fn validate_config(config: &FastDlConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for pattern in &config.access.forbidden_regexp {
        if let Err(e) = Regex::new(pattern) {
            errors.push(ValidationError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    for (index, rule) in config.rate_limits.iter().enumerate() {
        if rule.limit == 0 {
            errors.push(ValidationError::ZeroRateLimit { index });
        }
        if rule.period_secs == 0 {
            errors.push(ValidationError::ZeroRatePeriod { index });
        }
    }

    if let Some(range) = &config.listener.port_range {
        match config.listener.port_range() {
            Some((low, high)) if low <= high => {}
            _ => errors.push(ValidationError::InvalidPortRange {
                range: range.clone(),
            }),
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
