//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! process environment
//!     → env.rs (credentials, APP_ENV, debug opt-in)
//!     → StorageEnv snapshot
//!
//! Both are handed to lifecycle::startup and shared via Arc.
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secrets stay in the environment, never in the config file

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{Environment, KvConnection, StorageEnv};
pub use loader::{load_config, ConfigError};
pub use schema::{
    ContentConfig, DiagnosticsConfig, KvConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RetryConfig, ServiceConfig, StorageConfig, TimeoutConfig,
};
