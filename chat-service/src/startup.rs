//! Application startup and lifecycle management.

use crate::config::ChatConfig;
use crate::handlers;
use crate::services::gateways::{
    DiscoveryClient, DiscoveryGateway, GenerationGateway, WatsonxClient,
};
use crate::services::Orchestrator;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{catch_panic_layer, http_trace_layer, request_id_middleware};
use service_core::server::shutdown_signal;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Also used directly by document listing, which has no fallback.
    pub discovery: Option<Arc<dyn DiscoveryGateway>>,
}

impl AppState {
    pub fn new(
        discovery: Option<Arc<dyn DiscoveryGateway>>,
        generation: Option<Arc<dyn GenerationGateway>>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(discovery.clone(), generation),
            discovery,
        }
    }

    /// Construct the hosted gateways described by `config`. A gateway whose
    /// client cannot be built is left unavailable.
    pub fn from_config(config: &ChatConfig) -> Self {
        let discovery = config.discovery.as_ref().and_then(|discovery_config| {
            match DiscoveryClient::new(
                discovery_config.clone(),
                &config.iam_url,
                config.gateway_timeout,
            ) {
                Ok(client) => {
                    tracing::info!(
                        url = %discovery_config.url,
                        project_id = %discovery_config.project_id,
                        "Initialized Discovery gateway"
                    );
                    Some(Arc::new(client) as Arc<dyn DiscoveryGateway>)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discovery gateway unavailable");
                    None
                }
            }
        });

        let generation = config.generation.as_ref().and_then(|generation_config| {
            match WatsonxClient::new(
                generation_config.clone(),
                &config.iam_url,
                config.gateway_timeout,
            ) {
                Ok(client) => {
                    tracing::info!(
                        model = %generation_config.model_id,
                        "Initialized watsonx.ai generation gateway"
                    );
                    Some(Arc::new(client) as Arc<dyn GenerationGateway>)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "watsonx.ai generation gateway unavailable");
                    None
                }
            }
        });

        Self::new(discovery, generation)
    }
}

/// Routes for the chat API. Everything under `/api` accepts any origin.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/documents", get(handlers::list_documents))
        .layer(cors);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api)
        .layer(catch_panic_layer())
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config);
        Self::build_with_state(config, state).await
    }

    /// Build around an explicit state, e.g. one holding mock gateways.
    pub async fn build_with_state(config: ChatConfig, state: AppState) -> Result<Self, AppError> {
        let app = build_router(state);

        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("chat-service listening on port {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscoveryConfig, GenerationConfig};
    use crate::services::orchestrator::{ChatOutcome, NOT_CONFIGURED};
    use service_core::config::Config as CoreConfig;
    use std::time::Duration;

    fn config_with_discovery_url(url: &str) -> ChatConfig {
        ChatConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            discovery: Some(DiscoveryConfig {
                api_key: "key".to_string(),
                url: url.to_string(),
                project_id: "proj".to_string(),
                version: "2023-03-31".to_string(),
            }),
            generation: Some(GenerationConfig {
                api_key: "key".to_string(),
                url: "https://us-south.ml.cloud.ibm.com".to_string(),
                project_id: "proj".to_string(),
                model_id: "ibm/granite-3-8b-instruct".to_string(),
            }),
            iam_url: "http://127.0.0.1:1".to_string(),
            gateway_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn malformed_discovery_url_answers_not_configured() {
        let state = AppState::from_config(&config_with_discovery_url("not a url"));

        assert!(state.discovery.is_none());
        let outcome = state.orchestrator.run("give me a summary", "R.pdf").await;
        assert_eq!(outcome, ChatOutcome::NotConfigured);
        assert_eq!(outcome.into_text(), NOT_CONFIGURED);
    }

    #[test]
    fn malformed_iam_url_disables_discovery() {
        let mut config = config_with_discovery_url("https://api.example.com/instances/abc");
        config.iam_url = "iam.cloud.ibm.com".to_string();

        let state = AppState::from_config(&config);

        assert!(state.discovery.is_none());
    }

    #[test]
    fn valid_config_builds_discovery() {
        let state =
            AppState::from_config(&config_with_discovery_url("https://api.example.com/x"));
        assert!(state.discovery.is_some());
    }
}
