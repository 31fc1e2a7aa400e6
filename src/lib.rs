pub mod client;
pub mod clients;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod ws;

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use clients::executor_client::ExecutorClient;
use config::Config;
use docs::ApiDoc;
use routes::create_api_routes;
use ws::hub::SessionHub;

/// Shared state handed to every handler
pub struct AppState {
    pub hub: Arc<SessionHub>,
    pub executor: Option<ExecutorClient>,
}

impl AppState {
    pub fn new(hub: Arc<SessionHub>, executor: Option<ExecutorClient>) -> Self {
        Self { hub, executor }
    }

    /// Build the state from configuration. A bad executor URL only disables
    /// code execution; collaboration keeps working.
    pub fn from_config(config: &Config) -> Self {
        let executor = match &config.executor_url {
            Some(url) => match ExecutorClient::new(url, config.executor_timeout()) {
                Ok(client) => {
                    info!("Execution backend configured at {}", url);
                    Some(client)
                }
                Err(e) => {
                    warn!("Code execution disabled: {}", e);
                    None
                }
            },
            None => {
                warn!("No execution backend configured - code execution will not be available");
                None
            }
        };
        Self::new(Arc::new(SessionHub::new()), executor)
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    if origins.is_empty() && config.is_development() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    }
}

/// Assemble the HTTP and WebSocket routes
pub fn build_app(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/ws", get(ws::gateway::websocket_handler))
        .with_state(state.clone())
        // Mount API routes
        .nest("/api", create_api_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(config))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
