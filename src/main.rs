// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Alert registry host (systemd-friendly).
//! Opens the registry state and serves Prometheus metrics until shutdown.

use std::sync::Arc;

use amunchain_alerts::core::registry::{AlertRegistry, RegistryLimits};
use amunchain_alerts::core::types::{LogFormat, RegistryConfig};
use amunchain_alerts::monitoring::metrics::Metrics;
use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

fn init_logging(format: LogFormat) {
    let _ = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_target(false)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_level(true)
            .compact()
            .try_init(),
    };
}

fn load_config() -> Result<RegistryConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("AMUN_ALERTS_CONFIG").ok());
    match path {
        Some(p) => RegistryConfig::load(&p).with_context(|| format!("config {p}")),
        None => Ok(RegistryConfig::default()),
    }
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Result<String, StatusCode> {
    metrics
        .render()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(?e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(?e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = load_config()?;
    init_logging(cfg.logging.format);

    let metrics = Arc::new(Metrics::new().context("metrics init")?);
    let registry = AlertRegistry::open(&cfg.node.data_dir)
        .context("open registry state")?
        .with_limits(RegistryLimits::from(cfg.limits))
        .with_metrics(metrics.clone());

    info!(
        name = %cfg.node.name,
        data_dir = %cfg.node.data_dir,
        version = env!("CARGO_PKG_VERSION"),
        git_sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        build_ts = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        "alert registry starting"
    );
    info!(
        last_alert_id = registry.last_alert_id()?.0,
        state_root = %hex::encode(registry.state_root()?),
        "registry state loaded"
    );

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics);

    let listener = TcpListener::bind(&cfg.http.listen_addr)
        .await
        .with_context(|| format!("bind {}", cfg.http.listen_addr))?;
    info!(addr = %cfg.http.listen_addr, "metrics endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let flushed = registry.store().flush()?;
    info!(flushed, "alert registry stopped");
    Ok(())
}
