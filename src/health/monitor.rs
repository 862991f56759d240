//! Active health checking.
//!
//! # Responsibilities
//! - Probe every endpoint on a fixed interval
//! - Classify probe outcomes into alive / not alive
//! - Record results in the registry

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::balance::{Registry, Target};
use crate::config::HealthCheckConfig;

/// Background prober that keeps the registry's liveness flags current.
///
/// Owns its own HTTP client so probe connections never contend with
/// forwarded traffic.
pub struct HealthMonitor {
    registry: Arc<Registry>,
    client: Client<HttpConnector, Body>,
    interval: Duration,
    timeout: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, config: &HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            client,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run the probe loop until the shutdown signal fires.
    ///
    /// Endpoints start life alive, so the first round runs one full
    /// interval after start, like a plain repeating ticker. Rounds that
    /// overrun the interval are skipped, not queued.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.interval.as_secs(),
            timeout = self.timeout.as_secs(),
            endpoints = self.registry.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every endpoint once, in rotation order.
    async fn check_all(&self) {
        for (index, target) in self.registry.targets() {
            let alive = self.probe(&target).await;
            self.registry.record_probe(index, alive);

            tracing::info!(
                endpoint = %target,
                status = if alive { "up" } else { "down" },
                "Health check"
            );
        }
    }

    /// One header-only probe against the endpoint's base URL.
    async fn probe(&self, target: &Target) -> bool {
        let request = match Request::builder()
            .method(Method::HEAD)
            .uri(target.probe_uri())
            .header("user-agent", "rotor-health-check")
            .body(Body::empty())
        {
            Ok(request) => request,
            Err(error) => {
                tracing::error!(endpoint = %target, error = %error, "Failed to build probe request");
                return false;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let alive = classify(response.status());
                if !alive {
                    tracing::warn!(endpoint = %target, status = %response.status(), "Health check failed: server error status");
                }
                alive
            }
            Ok(Err(error)) => {
                tracing::warn!(endpoint = %target, error = %error, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(endpoint = %target, "Health check failed: timeout");
                false
            }
        }
    }
}

/// A completed probe means alive unless the backend answered with a server
/// error. Client errors still prove the process accepts traffic.
fn classify(status: StatusCode) -> bool {
    status.as_u16() < 500
}
