//! Listener binding.
//!
//! A fixed port is bound as configured. Port 0 with a `port_range` tries
//! random ports from the range; port 0 alone lets the OS pick.

use std::io;

use rand::Rng;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Random ports tried before giving up.
pub const MAX_BIND_ATTEMPTS: usize = 100;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("no free port in {low}-{high} after {attempts} attempts")]
    NoFreePort { low: u16, high: u16, attempts: usize },
}

async fn bind(host: &str, port: u16) -> Result<TcpListener, StartupError> {
    let address = format!("{}:{}", host, port);
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let host = config.bind_host();

    let (low, high) = match (config.port, config.port_range()) {
        (0, Some(range)) => range,
        (port, _) => return bind(host, port).await,
    };

    for attempt in 1..=MAX_BIND_ATTEMPTS {
        let port = rand::thread_rng().gen_range(low..=high);
        match bind(host, port).await {
            Ok(listener) => return Ok(listener),
            Err(e) => tracing::debug!(attempt, port, error = %e, "Port unavailable"),
        }
    }

    Err(StartupError::NoFreePort {
        low,
        high,
        attempts: MAX_BIND_ATTEMPTS,
    })
}
