//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config
//! file. Every field has a default so a minimal (or absent) file still
//! yields a runnable configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the balancer service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Balancer configuration (backend endpoints, mount prefix).
    pub balancer: BalancerConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Balancer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Ordered list of backend base URLs. The order here is the rotation
    /// order and is fixed for the life of the process.
    pub endpoints: Vec<String>,

    /// Path prefix the balancer is mounted under. The prefix is stripped
    /// before requests reach the balancer.
    pub route_prefix: String,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "http://localhost:8081".to_string(),
                "http://localhost:8082".to_string(),
            ],
            route_prefix: "/lb".to_string(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Seconds between probe rounds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds. Short, and independent of the
    /// interval.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            timeout_secs: 2,
        }
    }
}
