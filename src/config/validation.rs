//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint URLs parse and use a supported scheme
//! - Validate value ranges (bind address, mount prefix, probe timings)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: Config -> Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::Config;

/// A single validation failure, addressed by config path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("balancer.endpoints must not be empty")]
    NoEndpoints,

    #[error("balancer.endpoints[{index}]: {url:?} is not a valid absolute URL")]
    BadEndpointUrl { index: usize, url: String },

    #[error("balancer.endpoints[{index}]: {url:?} must use the http scheme")]
    BadEndpointScheme { index: usize, url: String },

    #[error("listener.bind_address {addr:?} is not a valid socket address")]
    BadBindAddress { addr: String },

    #[error("balancer.route_prefix {prefix:?} must start with '/', not end with '/', and contain no '{{' or '}}'")]
    BadRoutePrefix { prefix: String },

    #[error("health_check.{field} must be at least 1 second")]
    ZeroDuration { field: &'static str },
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.balancer.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    for (index, raw) in config.balancer.endpoints.iter().enumerate() {
        match Url::parse(raw) {
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::BadEndpointUrl {
                    index,
                    url: raw.clone(),
                });
            }
            Ok(url) if url.scheme() != "http" => {
                errors.push(ValidationError::BadEndpointScheme {
                    index,
                    url: raw.clone(),
                });
            }
            Ok(_) => {}
            Err(_) => {
                errors.push(ValidationError::BadEndpointUrl {
                    index,
                    url: raw.clone(),
                });
            }
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress {
            addr: config.listener.bind_address.clone(),
        });
    }

    let prefix = &config.balancer.route_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') || prefix.contains(['{', '}']) {
        errors.push(ValidationError::BadRoutePrefix {
            prefix: prefix.clone(),
        });
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "interval_secs",
        });
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "timeout_secs",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
