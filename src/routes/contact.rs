use crate::{
    error::{AppError, Result},
    models::contact::ContactRequest,
    services::contact::CONTACT_SENT_MESSAGE,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/contact", post(submit))
}

/// 联系表单
/// POST /api/contact
pub async fn submit(
    State(app_state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|rejection| AppError::bad_request(&rejection.body_text()))?;

    app_state.contact_service.send(&request).await?;

    Ok(Json(json!({
        "success": true,
        "message": CONTACT_SENT_MESSAGE
    })))
}
