// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! HTTP server for the Prometheus metrics endpoint
//!
//! Provides an Axum-based HTTP server that exposes the metrics store on a
//! configured path in Prometheus text exposition format, plus `/health`.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::{types::MetricsConfig, MetricsStore};

/// HTTP server for Prometheus metrics
#[derive(Clone)]
pub struct MetricsServer {
    store: MetricsStore,
    config: MetricsConfig,
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(store: MetricsStore, config: MetricsConfig) -> Self {
        Self { store, config }
    }

    /// Get the bind address for the server
    pub fn bind_address(&self) -> String {
        self.config.socket_addr()
    }

    /// Router serving the metrics endpoint and `/health`
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.endpoint, get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(self.store.clone())
    }

    /// Bind the listening socket
    ///
    /// Kept separate from [`serve_on`](Self::serve_on) so that a port that is
    /// already taken fails startup instead of a background task.
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind metrics server on {}: {}", addr, e))?;
        info!(
            "Metrics server listening on http://{}{}",
            listener.local_addr()?,
            self.config.endpoint
        );
        Ok(listener)
    }

    /// Serve requests on an already bound listener until the process exits
    pub async fn serve_on(self, listener: TcpListener) -> anyhow::Result<()> {
        axum::serve(listener, self.router())
            .await
            .map_err(|e| anyhow::anyhow!("Metrics server error: {}", e))
    }
}

/// Handler for the metrics endpoint
async fn metrics_handler(State(store): State<MetricsStore>) -> Response {
    debug!("Serving metrics");

    let metric_families = store.snapshot();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for `/health` endpoint
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
