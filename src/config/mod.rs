//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TokenConfig (validated, immutable)
//!     → passed by reference into each component's constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Signing keys never appear in the file, only the name of the env var holding them

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ConfirmationConfig, NetworkConfig, ObservabilityConfig, RetryConfig, TokenConfig, UnitsConfig,
};
