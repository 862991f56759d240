//! Request forwarding, the reverse-proxy hot path.
//!
//! # Responsibilities
//! - Select an endpoint and log the routing decision
//! - Rewrite the request for single-host upstream semantics
//! - Stream the upstream response back to the caller
//!
//! # Design Decisions
//! - Bodies stream through in both directions, never buffered
//! - Upstream connection failures surface as 502 Bad Gateway
//! - Forwarding failures never write liveness. Only the health monitor
//!   does, so a backend that dies mid-interval keeps its rotation slot
//!   until the next probe round.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
    Router,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::balance::registry::Registry;

/// State injected into the forwarding handler.
#[derive(Clone)]
pub struct ProxyState {
    pub registry: Arc<Registry>,
    pub client: Client<HttpConnector, Body>,
}

/// Build the balancer's router: every method and path lands on the
/// forwarding handler.
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/", any(forward))
        .route("/{*path}", any(forward))
        .with_state(state)
}

/// The forwarding route for the mount prefix requested with a trailing
/// slash. Nesting matches the bare prefix and any non-empty path under it,
/// but not the slashed prefix alone, so the outer app binds that form here.
pub fn mount_root(state: ProxyState) -> MethodRouter {
    any(forward_mount_root).with_state(state)
}

/// Forward a slashed mount-root request as the root path.
async fn forward_mount_root(
    state: State<ProxyState>,
    peer: ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response {
    let root = match request.uri().query() {
        Some(query) => format!("/?{query}")
            .parse()
            .unwrap_or_else(|_| Uri::from_static("/")),
        None => Uri::from_static("/"),
    };
    *request.uri_mut() = root;
    forward(state, peer, request).await
}

/// Forward one request to the next endpoint in rotation.
async fn forward(
    State(state): State<ProxyState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let selection = state.registry.select_next();

    tracing::info!(
        path = %request.uri().path(),
        endpoint = %selection.target,
        "Routing request"
    );

    let (mut parts, body) = request.into_parts();

    let uri = match selection.target.rewrite(&parts.uri) {
        Ok(uri) => uri,
        Err(error) => {
            tracing::error!(endpoint = %selection.target, error = %error, "Request URI rewrite failed");
            return bad_gateway();
        }
    };

    remove_hop_by_hop(&mut parts.headers);
    append_forwarded_for(&mut parts.headers, peer.ip());

    parts.uri = uri;
    // The upstream protocol belongs to our client, not the inbound request.
    parts.version = Version::HTTP_11;

    let upstream = Request::from_parts(parts, body);

    match state.client.request(upstream).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            remove_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(error) => {
            tracing::error!(endpoint = %selection.target, error = %error, "Upstream error");
            bad_gateway()
        }
    }
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}

/// Drop hop-by-hop headers: anything named by Connection, then the fixed
/// RFC 9110 set. These describe one connection and must not be relayed.
fn remove_hop_by_hop(headers: &mut HeaderMap) {
    let connection_named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();
    for name in connection_named {
        headers.remove(name);
    }

    headers.remove(header::CONNECTION);
    headers.remove("keep-alive");
    headers.remove(header::PROXY_AUTHENTICATE);
    headers.remove(header::PROXY_AUTHORIZATION);
    headers.remove(header::TE);
    headers.remove(header::TRAILER);
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::UPGRADE);
}

/// Append the connecting client to X-Forwarded-For, comma-joined after
/// whatever earlier proxies already recorded. Prior values may arrive as
/// several header lines; they collapse into the one line sent upstream.
fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    let forwarded = if prior.is_empty() {
        client.to_string()
    } else {
        format!("{}, {client}", prior.join(", "))
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded) {
        headers.insert("x-forwarded-for", value);
    }
}
