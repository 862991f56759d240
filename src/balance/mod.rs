//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (mount prefix already stripped)
//!     → forward.rs (handler)
//!     → registry.rs (select_next: round-robin with all-dead failover)
//!     → endpoint.rs (rewrite target applied to the request URI)
//!     → shared hyper client streams the exchange
//!
//! Independently:
//!     health monitor → registry.rs (record_probe, same lock)
//! ```
//!
//! # Design Decisions
//! - One balancer per process, built once from configuration and threaded
//!   explicitly to the router and the health monitor
//! - Selection state sits behind a single exclusive lock; the endpoint set
//!   never changes after construction
//! - All-dead failover resets every flag instead of refusing traffic

pub mod endpoint;
pub mod forward;
pub mod registry;

use std::sync::Arc;

use axum::body::Body;
use axum::routing::MethodRouter;
use axum::Router;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

pub use endpoint::{Endpoint, EndpointError, Target};
pub use forward::ProxyState;
pub use registry::{EndpointStatus, Registry, RegistryError, Selection};

/// The balancer: endpoint registry plus the HTTP client that forwards.
pub struct Balancer {
    registry: Arc<Registry>,
    client: Client<HttpConnector, Body>,
}

impl Balancer {
    /// Build a balancer from configured endpoint URLs.
    pub fn new<S: AsRef<str>>(endpoints: &[S]) -> Result<Self, RegistryError> {
        let registry = Arc::new(Registry::new(endpoints)?);
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { registry, client })
    }

    /// The shared registry, for wiring the health monitor.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// A router that sends every method and path through the rotation.
    pub fn router(&self) -> Router {
        forward::router(self.state())
    }

    /// The forwarding route for the slashed mount root, which nesting alone
    /// does not match.
    pub fn mount_root(&self) -> MethodRouter {
        forward::mount_root(self.state())
    }

    fn state(&self) -> ProxyState {
        ProxyState {
            registry: Arc::clone(&self.registry),
            client: self.client.clone(),
        }
    }
}
