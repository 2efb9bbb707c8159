//! # ttlkv API Server
//!
//! HTTP adapter over the expiring cache engine. It translates requests
//! into `get`/`set` calls and formats the results; all input validation
//! happens here, never in the engine.
//!
//! ## Endpoints
//!
//! - `GET /get?key=K` - Fetch a live value (`404` if absent or expired)
//! - `POST /set` - Store `{key, value, expiration}` (`201` on success)
//! - `GET /health` - Liveness and uptime
//!
//! ## Example
//!
//! ```rust,ignore
//! use ttlkv_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::new(ApiConfig::from_env()?)?;
//! server.run(([0, 0, 0, 0], 8080)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server for ttlkv.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server with the given configuration.
    ///
    /// Starts the cache's background sweeper, so this must run inside a
    /// Tokio runtime.
    pub fn new(config: ApiConfig) -> ttlkv_core::Result<Self> {
        Ok(Self {
            state: Arc::new(AppState::new(config)?),
        })
    }

    /// Creates the router with all routes and layers configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_bytes))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> ttlkv_core::Result<()> {
        let listener = TcpListener::bind(addr.into()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` completes,
    /// then drains connections and stops the cache sweeper.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> ttlkv_core::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!("ttlkv API server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.state.cache.shutdown().await;
        info!("ttlkv API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!(error = %err, "Failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_run_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let server = ApiServer::new(ApiConfig::default()).unwrap();

        let result = server.run(addr).await;
        assert!(matches!(result, Err(ttlkv_core::TtlkvError::IoError(_))));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let config = ApiConfig {
            max_body_bytes: 64,
            ..ApiConfig::default()
        };
        let server = ApiServer::new(config).unwrap();

        let body = serde_json::json!({
            "key": "big",
            "value": "x".repeat(256),
            "expiration": "5s",
        })
        .to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/set")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert!(server.state.cache.is_empty());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let server = ApiServer::new(ApiConfig::default()).unwrap();
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
