//! rotor: round-robin reverse-proxy load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                    ROTOR                      │
//!                      │                                               │
//!   Client Request     │  ┌────────┐   ┌───────────┐   ┌──────────┐   │
//!   ───────────────────┼─▶│ server │──▶│  balance  │──▶│  hyper   │───┼──▶ Backend
//!                      │  │ /lb/*  │   │ registry  │   │  client  │   │    (rotation)
//!                      │  └────────┘   │ + forward │   └──────────┘   │
//!   Client Response    │               └───────────┘                  │
//!   ◀──────────────────┼──────(streamed back unchanged)───────────────┤
//!                      │                                               │
//!                      │  ┌─────────────────────────────────────────┐  │
//!                      │  │   health monitor (periodic HEAD probes) │  │
//!                      │  │   config / lifecycle / tracing          │  │
//!                      │  └─────────────────────────────────────────┘  │
//!                      └───────────────────────────────────────────────┘
//! ```
//!
//! Startup order: config, balancer, monitor task, listener. Shutdown is
//! the reverse: the first OS signal stops the accept loop, in-flight
//! requests drain, then the monitor is told to exit.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rotor::balance::Balancer;
use rotor::config::load_config;
use rotor::health::HealthMonitor;
use rotor::lifecycle::{signals, Shutdown};
use rotor::server;

/// Round-robin reverse-proxy load balancer.
#[derive(Parser)]
#[command(name = "rotor", version, about)]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "rotor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rotor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        route_prefix = %config.balancer.route_prefix,
        endpoints = config.balancer.endpoints.len(),
        check_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    let balancer = Balancer::new(&config.balancer.endpoints)?;
    for status in balancer.registry().status() {
        tracing::info!(endpoint = %status.target, "Registered endpoint");
    }

    let shutdown = Shutdown::new();

    let monitor = HealthMonitor::new(balancer.registry(), &config.health_check);
    tokio::spawn(monitor.run(shutdown.subscribe()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::shutdown_signal().await;
            shutdown.trigger();
        });
    }

    let app = server::app(&balancer, &config.balancer.route_prefix);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server::serve(listener, app, shutdown.subscribe()).await?;

    // The server has drained; stop the monitor too in case the trigger
    // above never fired (serve can also end on listener errors).
    shutdown.trigger();

    tracing::info!("Shutdown complete");
    Ok(())
}
