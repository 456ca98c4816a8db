//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;

/// Root configuration for the FastDL server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FastDlConfig {
    /// Listener configuration (host, port, random port range).
    pub listener: ListenerConfig,

    /// Render HTML listings for directory requests.
    pub auto_index_enabled: bool,

    /// Only serve resources the engine precached for the current map.
    pub serve_precached: bool,

    /// File and directory filtering rules.
    pub access: AccessConfig,

    /// In-memory file cache settings.
    pub cache: CacheConfig,

    /// Download URL advertised to clients instead of `http://host:port`.
    pub custom_download_url: Option<String>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-client rate limits, evaluated in order.
    pub rate_limits: Vec<RateLimitRule>,

    /// Blocked clients: literal IPs, CIDR subnets or `start-end` ranges.
    pub block_list_ip: Vec<String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Host control API settings.
    pub admin: AdminConfig,
}

impl FastDlConfig {
    /// URL the game server should hand out as its download location.
    ///
    /// Returns `None` when no routable address is known.
    pub fn download_url(&self, port: u16) -> Option<String> {
        if let Some(url) = self.custom_download_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }

        let host = self.listener.host.as_str();
        if host.is_empty() || host == "0.0.0.0" {
            return None;
        }

        Some(format!("http://{}:{}", host, port))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to bind and advertise. Empty binds all interfaces.
    pub host: String,

    /// Port to bind. Zero picks one (see `port_range`).
    pub port: u16,

    /// Inclusive `"low-high"` range to pick a random port from when `port` is zero.
    pub port_range: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            port_range: None,
        }
    }
}

impl ListenerConfig {
    pub fn bind_host(&self) -> &str {
        if self.host.is_empty() {
            "0.0.0.0"
        } else {
            &self.host
        }
    }

    /// Parsed `port_range`, if present and well formed.
    pub fn port_range(&self) -> Option<(u16, u16)> {
        let range = self.port_range.as_deref()?;
        let (low, high) = range.split_once('-')?;
        let low = low.trim().parse().ok()?;
        let high = high.trim().parse().ok()?;
        Some((low, high))
    }
}

/// File and directory filtering rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Patterns matched against file names and directory paths.
    pub forbidden_regexp: Vec<String>,

    /// Extensions that are never served.
    pub forbidden_extensions: Vec<String>,

    /// Extensions that are served. Empty allows every extension.
    pub allowed_extensions: Vec<String>,

    /// Directory prefixes that are never listed.
    pub forbidden_paths: Vec<String>,

    /// Directory prefixes that may be listed. Empty allows every directory.
    pub allowed_paths: Vec<String>,
}

impl AccessConfig {
    /// No rules at all: every list empty.
    pub fn empty() -> Self {
        Self {
            forbidden_regexp: Vec::new(),
            forbidden_extensions: Vec::new(),
            allowed_extensions: Vec::new(),
            forbidden_paths: Vec::new(),
            allowed_paths: Vec::new(),
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            forbidden_regexp: vec!["mapcycle.*".to_string(), ".*textscheme.*".to_string()],
            forbidden_extensions: Vec::new(),
            allowed_extensions: [
                "bmp", "bsp", "gif", "jpeg", "jpg", "lmp", "lst", "mdl", "mp3", "png", "res",
                "spr", "tga", "txt", "wad", "wav", "zip",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
            forbidden_paths: Vec::new(),
            allowed_paths: [
                "gfx",
                "maps",
                "media",
                "models",
                "overviews",
                "sound",
                "sprites",
            ]
            .iter()
            .map(|path| path.to_string())
            .collect(),
        }
    }
}

/// In-memory file cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum total size of cached file contents (e.g. `"100MB"`).
    pub size: CacheSize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: CacheSize("100MB".to_string()),
        }
    }
}

/// Human readable byte size: digits followed by an optional `KB`, `MB`,
/// `GB` or `TB` unit (powers of 1024). Anything else counts as bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CacheSize(pub String);

impl CacheSize {
    /// Size in bytes; zero when the number cannot be parsed.
    pub fn bytes(&self) -> u64 {
        let normalized = self.0.trim().to_uppercase();
        let split = normalized
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(normalized.len());
        let (number, unit) = normalized.split_at(split);

        let number: u64 = match number.parse() {
            Ok(n) => n,
            Err(_) => return 0,
        };

        let multiplier: u64 = match unit.trim() {
            "KB" => 1024,
            "MB" => 1024 * 1024,
            "GB" => 1024 * 1024 * 1024,
            "TB" => 1024 * 1024 * 1024 * 1024,
            _ => 1,
        };

        number.saturating_mul(multiplier)
    }

    /// Effective cache capacity, falling back to the built-in default.
    pub fn capacity(&self) -> u64 {
        match self.bytes() {
            0 => DEFAULT_CAPACITY,
            bytes => bytes,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce a response, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// One fixed-window rate limit.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Window length in seconds.
    pub period_secs: u64,

    /// Requests admitted per client within one window.
    pub limit: u32,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Host control API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the control API used by the game server.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Control API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
