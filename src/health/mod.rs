//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.rs:
//!     Periodic timer
//!     → HEAD probe per endpoint (own client, short timeout)
//!     → classify outcome
//!     → registry.record_probe
//! ```
//!
//! # Design Decisions
//! - Probing is active only. Forwarding failures are not health signals;
//!   the registry's alive flags change exclusively here and in the
//!   all-dead reset.
//! - A probe that completes with any status below 500 counts as alive
//! - One flag per endpoint, no consecutive-failure thresholds

pub mod monitor;

pub use monitor::HealthMonitor;
