use crate::{
    models::session::PublicUser,
    services::AuthenticatedSession,
    state::AppState,
};
use axum::{response::Json, routing::get, Router};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(get_current_user))
}

/// 获取当前用户信息
/// GET /api/users/me
pub async fn get_current_user(AuthenticatedSession(session): AuthenticatedSession) -> Json<PublicUser> {
    debug!("Getting current user info for user: {}", session.id);
    Json(session.to_public())
}
