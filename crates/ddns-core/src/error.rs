//! Error types for the DDNS system
//!
//! This module defines the error type shared by the engine, the IP sources
//! and the DNS providers. Provider crates keep their own fine-grained error
//! enums and convert into [`Error`] at the trait boundary.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// IP source-related errors (public IP discovery failed)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors, including malformed credential encoding
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse errors while loading the configuration file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parse errors while loading the configuration file
    #[error("YAML error: {0}")]
    Yaml(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the configuration layer
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Toml(_) | Self::Yaml(_))
    }
}
