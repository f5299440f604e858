use crate::handlers;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::config::Config;
use service_core::error::AppError;
use service_core::middleware::{catch_panic_layer, http_trace_layer, request_id_middleware};
use service_core::server::shutdown_signal;
use std::future::IntoFuture;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub fn build_router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/process", post(handlers::process_input))
        .layer(cors);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(catch_panic_layer())
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let address = config.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("echo-service listening on port {}", port);

        let server =
            axum::serve(listener, build_router()).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
