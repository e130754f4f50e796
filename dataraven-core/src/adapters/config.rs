//! Data source connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pool and session settings applied when a SQL source is opened.
///
/// Credentials live only in the connection URL and are never stored here.
///
/// # Example
/// ```rust
/// use dataraven_core::adapters::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::default()
///     .with_query_timeout(Duration::from_secs(120))
///     .with_max_connections(2);
///
/// assert!(config.validate().is_ok());
/// assert!(config.read_only);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Time allowed to acquire a pooled connection
    pub connect_timeout: Duration,
    /// Per-statement timeout set on every session
    pub query_timeout: Duration,
    /// Maximum number of connections in pool
    pub max_connections: u32,
    /// Open sessions read-only
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(300),
            max_connections: 4,
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig(max_connections={}, query_timeout={}s{})",
            self.max_connections,
            self.query_timeout.as_secs(),
            if self.read_only { ", read-only" } else { "" }
        )
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns a configuration error if a value is zero or out of range
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_connections == 0 {
            return Err(crate::error::DataRavenError::configuration(
                "max_connections must be greater than 0",
            ));
        }

        if self.max_connections > 100 {
            return Err(crate::error::DataRavenError::configuration(
                "max_connections should not exceed 100",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::DataRavenError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.query_timeout.is_zero() {
            return Err(crate::error::DataRavenError::configuration(
                "query_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set the acquire timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder method to set the statement timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Builder method to set the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}
