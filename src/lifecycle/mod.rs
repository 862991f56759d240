//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build balancer → Spawn monitor → Listen
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Shutdown::trigger → subscribers wind down
//!         server: stop accepting, drain in-flight requests
//!         monitor: exit the probe loop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown_signal resolves once
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - One broadcast channel fans the shutdown signal out to every task

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
