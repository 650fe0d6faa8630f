//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::{build_prompt, GenerationRequest};
use crate::http::error::ApiError;
use crate::http::server::AppState;

pub const HEALTH_BODY: &str = "Server is running";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, HEALTH_BODY)
}

/// `POST /api/generate`.
///
/// Runs after admission control. A client disconnect drops this future and
/// with it the in-flight backend call.
pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    generate(&state, payload).await.map(Json)
}

async fn generate(
    state: &AppState,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<GenerateResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::MalformedRequest("Invalid request body".to_string())
    })?;
    request
        .validate()
        .map_err(|e| ApiError::MalformedRequest(e.to_string()))?;

    let prompt = build_prompt(&request);
    let cancel = state.shutdown.child();
    let generation = state.dispatcher.generate(&prompt, &cancel).await?;

    tracing::info!(
        model = %generation.model,
        content_type = %request.content_type,
        chars = generation.text.len(),
        "Content generated"
    );

    let filename = match &state.store {
        Some(store) => match store.save(&generation.text, &request.content_type).await {
            Ok(location) => Some(location),
            Err(e) => {
                tracing::error!(error = %e, "Failed to save generated content");
                None
            }
        },
        None => None,
    };

    Ok(GenerateResponse {
        content: generation.text,
        filename,
    })
}
