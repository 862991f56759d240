//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, defaults when absent)
//!     → validation.rs (semantic checks, every violation reported)
//!     → Config (validated, immutable)
//!     → handed to the balancer, monitor and server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults so a missing file still boots the process
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BalancerConfig, Config, HealthCheckConfig, ListenerConfig};
