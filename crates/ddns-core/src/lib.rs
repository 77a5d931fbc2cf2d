// # ddns-core
//
// Core library for the onamae dynamic DNS agent.
//
// ## Architecture Overview
//
// This library provides the registrar-independent half of the agent:
// - **IpSource**: Trait for discovering the current public IP address
// - **DnsProvider**: Trait for pushing a new address to the registrar in one session
// - **DdnsEngine**: Change-detection loop that decides when a session is needed
// - **ProviderRegistry**: Plugin-based registry for providers and IP sources
// - **DdnsConfig**: Credentials, domains and tuning, loaded once from TOML
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The engine never speaks the registrar protocol
// 2. **Single Flow**: One cycle at a time; the last observed IP is plain engine state
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Survivable**: A failed cycle is logged and the next tick runs as usual

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, ObservedIp, TickOutcome};
pub use registry::ProviderRegistry;
pub use config::{ConfigFormat, Credentials, DdnsConfig, DomainConfig, EngineConfig, IpSourceConfig, ProviderConfig};
pub use error::{Error, Result};
