//! End-to-end forwarding behavior through the mounted balancer.

use std::net::SocketAddr;

use axum::http::StatusCode;
use rotor::balance::Balancer;
use rotor::lifecycle::Shutdown;
use rotor::server;

mod common;

/// Boot a balancer on an ephemeral port. Returns the proxy address and the
/// shutdown handle that stops it.
async fn start_proxy(endpoints: &[String], route_prefix: &str) -> (SocketAddr, Shutdown) {
    let balancer = Balancer::new(endpoints).unwrap();
    let app = server::app(&balancer, route_prefix);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server::serve(listener, app, server_shutdown).await;
    });

    (addr, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_rotates_across_backends_in_order() {
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::start_mock_backend("b2").await;

    let (proxy, shutdown) =
        start_proxy(&[format!("http://{b1}"), format!("http://{b2}")], "/lb").await;

    let client = client();
    let mut bodies = Vec::new();
    for _ in 0..4 {
        let res = client
            .get(format!("http://{proxy}/lb/"))
            .send()
            .await
            .expect("Proxy unreachable");
        bodies.push(res.text().await.unwrap());
    }

    // The scan starts one past the cursor, so the second endpoint goes
    // first.
    assert_eq!(bodies, vec!["b2", "b1", "b2", "b1"]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_strips_mount_prefix_before_forwarding() {
    let echo = common::start_path_echo_backend().await;

    let (proxy, shutdown) = start_proxy(&[format!("http://{echo}")], "/lb").await;

    let client = client();
    let res = client
        .get(format!("http://{proxy}/lb/alpha/beta?q=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "/alpha/beta?q=1");

    shutdown.trigger();
}

#[tokio::test]
async fn test_mount_root_serves_with_and_without_trailing_slash() {
    let echo = common::start_path_echo_backend().await;

    let (proxy, shutdown) = start_proxy(&[format!("http://{echo}")], "/lb").await;

    let client = client();
    let cases = [
        ("/lb", "/"),
        ("/lb/", "/"),
        ("/lb/x", "/x"),
        ("/lb/?q=1", "/?q=1"),
    ];
    for (request_path, upstream_target) in cases {
        let res = client
            .get(format!("http://{proxy}{request_path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{request_path}");
        assert_eq!(res.text().await.unwrap(), upstream_target, "{request_path}");
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_joins_endpoint_base_path_with_request_path() {
    let echo = common::start_path_echo_backend().await;

    let (proxy, shutdown) = start_proxy(&[format!("http://{echo}/api")], "/lb").await;

    let client = client();
    let res = client
        .get(format!("http://{proxy}/lb/x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.text().await.unwrap(), "/api/x");

    shutdown.trigger();
}

#[tokio::test]
async fn test_refused_upstream_surfaces_as_bad_gateway() {
    let dead = common::refused_addr();

    let (proxy, shutdown) = start_proxy(&[format!("http://{dead}")], "/lb").await;

    let client = client();
    let res = client
        .get(format!("http://{proxy}/lb/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}

#[tokio::test]
async fn test_forwarding_failures_leave_the_rotation_unchanged() {
    // One live backend, one dead one, and no monitor running: the dead
    // endpoint keeps its rotation slot, so every other request fails.
    let live = common::start_mock_backend("live").await;
    let dead = common::refused_addr();

    let (proxy, shutdown) =
        start_proxy(&[format!("http://{live}"), format!("http://{dead}")], "/lb").await;

    let client = client();
    let mut statuses = Vec::new();
    for _ in 0..4 {
        let res = client
            .get(format!("http://{proxy}/lb/"))
            .send()
            .await
            .unwrap();
        statuses.push(res.status().as_u16());
    }

    // The dead endpoint sits at index 1 and is selected first.
    assert_eq!(statuses, vec![502, 200, 502, 200]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_total_outage_always_answers_rather_than_refusing() {
    let d1 = common::refused_addr();
    let d2 = common::refused_addr();

    let (proxy, shutdown) =
        start_proxy(&[format!("http://{d1}"), format!("http://{d2}")], "/lb").await;

    let client = client();
    for _ in 0..5 {
        let res = client
            .get(format!("http://{proxy}/lb/"))
            .send()
            .await
            .expect("Proxy should answer even with every backend down");
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_statuses_pass_through_unchanged() {
    let missing =
        common::start_programmable_backend(|| async { (404, "no such thing".to_string()) }).await;

    let (proxy, shutdown) = start_proxy(&[format!("http://{missing}")], "/lb").await;

    let client = client();
    let res = client
        .get(format!("http://{proxy}/lb/thing"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "no such thing");

    shutdown.trigger();
}

#[tokio::test]
async fn test_paths_outside_the_prefix_are_not_forwarded() {
    let backend = common::start_mock_backend("backend").await;

    let (proxy, shutdown) = start_proxy(&[format!("http://{backend}")], "/lb").await;

    let client = client();
    let res = client
        .get(format!("http://{proxy}/elsewhere"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}
