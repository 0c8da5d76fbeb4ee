pub mod api_routes;
pub mod ws_routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::{OpenAiImageService, OpenAiTextService};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::service::session::ChatSession;

pub type LiveSession = ChatSession<OpenAiTextService, OpenAiImageService>;

/// Shared router state: the provider adapters every session talks to.
#[derive(Clone)]
pub struct AppContext {
    text: Arc<OpenAiTextService>,
    image: Arc<OpenAiImageService>,
}

impl AppContext {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            text: Arc::new(OpenAiTextService::new(config)?),
            image: Arc::new(OpenAiImageService::new(config)?),
        })
    }

    /// A fresh, empty session; one per connected client.
    pub fn new_session(&self) -> LiveSession {
        ChatSession::new(Arc::clone(&self.text), Arc::clone(&self.image))
    }
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/ws/session", get(ws_routes::ws_session_handler))
        .route("/api/info", get(api_routes::info_handler))
        .route("/api/health", get(api_routes::health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
