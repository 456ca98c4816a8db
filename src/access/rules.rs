//! Compiled access rule set.

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

use crate::config::AccessConfig;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("invalid forbidden pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Immutable allow/deny rules built from configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessRules {
    pub(crate) allowed_extensions: HashSet<String>,
    pub(crate) forbidden_extensions: HashSet<String>,
    pub(crate) allowed_paths: Vec<String>,
    pub(crate) forbidden_paths: Vec<String>,
    pub(crate) forbidden_patterns: Vec<Regex>,
}

impl AccessRules {
    /// Normalize the configured lists and compile every pattern.
    pub fn from_config(config: &AccessConfig) -> Result<Self, AccessError> {
        let forbidden_patterns = config
            .forbidden_regexp
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| AccessError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allowed_extensions: normalize_extensions(&config.allowed_extensions),
            forbidden_extensions: normalize_extensions(&config.forbidden_extensions),
            allowed_paths: normalize_prefixes(&config.allowed_paths),
            forbidden_paths: normalize_prefixes(&config.forbidden_paths),
            forbidden_patterns,
        })
    }

    pub fn extension_allowed(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(ext)
    }

    pub fn extension_forbidden(&self, ext: &str) -> bool {
        self.forbidden_extensions.contains(ext)
    }

    pub fn matches_forbidden_pattern(&self, subject: &str) -> bool {
        self.forbidden_patterns.iter().any(|re| re.is_match(subject))
    }

    pub fn path_forbidden(&self, path: &str) -> bool {
        self.forbidden_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn path_allowed(&self, path: &str) -> bool {
        self.allowed_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn has_allowed_extensions(&self) -> bool {
        !self.allowed_extensions.is_empty()
    }

    pub fn has_allowed_paths(&self) -> bool {
        !self.allowed_paths.is_empty()
    }
}

/// Lower-case, without leading dots.
fn normalize_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Prefixes are compared against paths without a leading slash.
fn normalize_prefixes(prefixes: &[String]) -> Vec<String> {
    prefixes
        .iter()
        .map(|prefix| prefix.trim().trim_start_matches('/').to_string())
        .filter(|prefix| !prefix.is_empty())
        .collect()
}
