use axum::extract::State;
use axum::Json;

use crate::models::{AppMode, InfoResponse};
use crate::routes::AppContext;

/// GET `/api/info` — configured models and the available modes
pub async fn info_handler(State(ctx): State<AppContext>) -> Json<InfoResponse> {
    Json(ctx.info())
}

/// GET `/api/health` — liveness probe
pub async fn health_handler() -> &'static str {
    "ok"
}

impl AppContext {
    pub fn info(&self) -> InfoResponse {
        InfoResponse {
            text_model: self.text.model().to_string(),
            image_model: self.image.model().to_string(),
            modes: AppMode::ALL.to_vec(),
        }
    }
}
