//! Round-robin reverse-proxy load balancer.
//!
//! rotor accepts HTTP requests under a mount prefix, picks the next alive
//! backend in a fixed rotation, and streams the exchange through to it,
//! while a background task refreshes per-backend liveness with periodic
//! HEAD probes.

pub mod balance;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod server;

pub use balance::Balancer;
pub use config::Config;
pub use health::HealthMonitor;
pub use lifecycle::Shutdown;
