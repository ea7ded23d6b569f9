use crate::{
    error::{AppError, Result},
    models::chat::{ChatRequest, ChatResponse},
    services::AuthenticatedSession,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(ask))
}

/// 智能问答
/// POST /api/chat
pub async fn ask(
    State(app_state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::bad_request(&rejection.body_text()))?;
    debug!("Chat question for {} on {}", session.email, request.property_id);

    let response = app_state.chat_service.answer(&session, &request).await?;
    Ok(Json(response))
}
