//! Outer HTTP server assembly.
//!
//! # Responsibilities
//! - Mount the balancer's router under the configured path prefix, so the
//!   forwarding handler sees endpoint-relative paths
//! - Serve with graceful shutdown wired to the process-wide signal
//!
//! Anything outside the mount prefix falls through to the default 404.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::balance::Balancer;

/// Build the service router: the balancer nested under `route_prefix`.
///
/// Nesting strips the prefix before the balancer's routes match, which is
/// what makes `/lb/users/1` reach the backends as `/users/1`. The slashed
/// mount root (`/lb/`) needs its own route: nesting matches the bare prefix
/// and non-empty paths under it, but not that form.
pub fn app(balancer: &Balancer, route_prefix: &str) -> Router {
    let slashed_root = format!("{route_prefix}/");
    Router::new()
        .nest(route_prefix, balancer.router())
        .route(&slashed_root, balancer.mount_root())
        .layer(TraceLayer::new_for_http())
}

/// Serve until the shutdown signal fires, then drain and return.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown.recv().await;
    })
    .await
}
