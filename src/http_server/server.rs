//! # HTTP Server
//!
//! Binds the listener and serves the combined router until shutdown.

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::record_routes::record_routes;
use super::root_routes::root_routes;
use super::state::AppState;
use crate::observability::Logger;

/// HTTP server for the records API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
    logger: Logger,
}

impl HttpServer {
    /// Create a server around `state`
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let logger = state.logger.clone();
        let router = Self::build_router(&config, state);
        Self {
            config,
            router,
            logger,
        }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(root_routes(state.clone()))
            .merge(record_routes(state))
            .layer(ServiceBuilder::new().layer(cors))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.logger.info(format_args!(
            "Server is now listening at port {}",
            listener.local_addr()?.port()
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
