//! Configuration types for the DDNS system
//!
//! The configuration mirrors the registrar's view of the world: one set of
//! credentials and an ordered list of domains, each with an ordered list of
//! hosts. It is loaded once at startup and never reloaded.
//!
//! ```toml
//! auth = "dXNlcjpwYXNz" # base64("user:pass")
//!
//! [[domains]]
//! name = "example.com"
//!
//! [[domains.hosts]]
//! name = "www"
//!
//! [[domains.hosts]]
//! name = "" # apex
//! ```
//!
//! The same layout is also read from YAML (`config.yml`), the format used by
//! earlier onamae DDNS clients:
//!
//! ```yaml
//! auth: dXNlcjpwYXNz
//! domains:
//!   - name: example.com
//!     hosts:
//!       - name: www
//!       - name:
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::traits::UpdateTarget;

/// Default public IP discovery endpoint (plain-text body)
pub const DEFAULT_IP_SOURCE_URL: &str = "http://inet-ip.info/ip";

/// Default registrar host
pub const DEFAULT_ONAMAE_HOST: &str = "ddnsclient.onamae.com";

/// Default registrar port
pub const DEFAULT_ONAMAE_PORT: u16 = 65010;

/// Main DDNS configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// `username:password` encoded as standard Base64
    ///
    /// May be left out of the file and supplied through [`DdnsConfig::with_auth`].
    #[serde(default)]
    pub auth: String,

    /// Domains to manage, in update order
    pub domains: Vec<DomainConfig>,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a new configuration with default sections
    pub fn new(auth: impl Into<String>, domains: Vec<DomainConfig>) -> Self {
        Self {
            auth: auth.into(),
            domains,
            ip_source: IpSourceConfig::default(),
            provider: ProviderConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, crate::Error> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a configuration from YAML text
    ///
    /// Accepts the `config.yml` layout of earlier onamae DDNS clients
    /// (`auth`, `domains[].name`, `domains[].hosts[].name`).
    pub fn from_yaml_str(text: &str) -> Result<Self, crate::Error> {
        serde_saphyr::from_str(text).map_err(|e| crate::Error::Yaml(e.to_string()))
    }

    /// Parse configuration text in the given format
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, crate::Error> {
        match format {
            ConfigFormat::Toml => Self::from_toml_str(text),
            ConfigFormat::Yaml => Self::from_yaml_str(text),
        }
    }

    /// Read and parse a configuration file
    ///
    /// The format follows the file extension (see [`ConfigFormat::from_path`]).
    /// The result is not validated; call [`DdnsConfig::validate`] once any
    /// overrides have been applied.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&text, ConfigFormat::from_path(path))
    }

    /// Replace the stored credential blob
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = auth.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        Credentials::decode(&self.auth)?;

        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err(crate::Error::config("Domain name cannot be empty"));
            }
        }

        if self.targets().is_empty() {
            return Err(crate::Error::config("No hosts configured for any domain"));
        }

        self.provider.validate()?;
        self.ip_source.validate()?;
        self.engine.validate()?;

        Ok(())
    }

    /// Flatten the domains into update targets
    ///
    /// Order is significant: domains in configuration order, and within a
    /// domain, hosts in configuration order.
    pub fn targets(&self) -> Vec<UpdateTarget> {
        self.domains
            .iter()
            .flat_map(|domain| {
                domain
                    .hosts
                    .iter()
                    .map(|host| UpdateTarget::new(host.name.clone(), domain.name.clone()))
            })
            .collect()
    }
}

// Credentials stay out of logs
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("auth", &"<REDACTED>")
            .field("domains", &self.domains)
            .field("ip_source", &self.ip_source)
            .field("provider", &self.provider)
            .field("engine", &self.engine)
            .finish()
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (`.toml`, and anything without a YAML extension)
    Toml,
    /// YAML (`.yml` / `.yaml`)
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Toml,
        }
    }
}

// YAML writes an empty value (`name:`) as null
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One registrar-managed domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name (e.g., "example.com")
    pub name: String,

    /// Hosts under this domain; an empty host name targets the apex
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: Vec<HostConfig>,
}

impl DomainConfig {
    /// Create a domain with no hosts
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: Vec::new(),
        }
    }

    /// Append a host
    pub fn with_host(mut self, name: impl Into<String>) -> Self {
        self.hosts.push(HostConfig { name: name.into() });
        self
    }

    /// Append the apex (bare domain) as a target
    pub fn with_apex(self) -> Self {
        self.with_host("")
    }
}

/// One host entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host label; empty for the apex
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Decoded registrar credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Registrar user id
    pub username: String,
    /// Registrar password
    pub password: String,
}

impl Credentials {
    /// Decode the Base64 `username:password` blob
    ///
    /// The decoded text is split on the first `:` only, so the password may
    /// itself contain colons. Text without any `:` is rejected.
    pub fn decode(auth: &str) -> Result<Self, crate::Error> {
        let bytes = STANDARD
            .decode(auth.trim())
            .map_err(|e| crate::Error::config(format!("auth is not valid Base64: {}", e)))?;

        let text = String::from_utf8(bytes)
            .map_err(|_| crate::Error::config("auth does not decode to UTF-8 text"))?;

        let (username, password) = text
            .split_once(':')
            .ok_or_else(|| crate::Error::config("auth must decode to \"username:password\""))?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Encode credentials the way [`Credentials::decode`] expects them
    pub fn encode(username: &str, password: &str) -> String {
        STANDARD.encode(format!("{}:{}", username, password))
    }
}

// Password stays out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// IP source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// HTTP-based IP source (plain-text body)
    Http {
        /// URL to fetch IP from
        #[serde(default = "default_ip_source_url")]
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_http_timeout_secs")]
        timeout_secs: u64,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP IP source URL cannot be empty"));
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "HTTP IP source URL must use http or https: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("HTTP IP source timeout must be > 0"));
                }
                Ok(())
            }
        }
    }

    /// Get the IP source type name
    pub fn type_name(&self) -> &str {
        match self {
            IpSourceConfig::Http { .. } => "http",
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::Http {
            url: default_ip_source_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// onamae.com ddnsclient protocol over TLS
    Onamae {
        /// Registrar host (also the TLS server name)
        #[serde(default = "default_onamae_host")]
        host: String,
        /// Registrar port
        #[serde(default = "default_onamae_port")]
        port: u16,
        /// Deadline for each connect/send/receive/close, in seconds
        #[serde(default = "default_io_timeout_secs")]
        io_timeout_secs: u64,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Onamae {
                host,
                port,
                io_timeout_secs,
            } => {
                if host.is_empty() {
                    return Err(crate::Error::config("Registrar host cannot be empty"));
                }
                if *port == 0 {
                    return Err(crate::Error::config("Registrar port cannot be 0"));
                }
                if *io_timeout_secs == 0 {
                    return Err(crate::Error::config("Registrar I/O timeout must be > 0"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Onamae { .. } => "onamae",
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Onamae {
            host: default_onamae_host(),
            port: default_onamae_port(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between public IP checks (in seconds)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.check_interval_secs == 0 {
            return Err(crate::Error::config("check_interval_secs must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_ip_source_url() -> String {
    DEFAULT_IP_SOURCE_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_onamae_host() -> String {
    DEFAULT_ONAMAE_HOST.to_string()
}

fn default_onamae_port() -> u16 {
    DEFAULT_ONAMAE_PORT
}

fn default_io_timeout_secs() -> u64 {
    30
}

fn default_check_interval_secs() -> u64 {
    600
}

fn default_event_channel_capacity() -> usize {
    100
}
