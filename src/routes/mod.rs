pub mod auth;
pub mod chat;
pub mod contact;
pub mod ga4;
pub mod users;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

/// 构建应用路由
pub fn router(app_state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(chat::router())
        .merge(contact::router())
        .nest("/users", users::router())
        .nest("/ga4", ga4::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .fallback(fallback)
        .with_state(app_state)
}

async fn health_check() -> &'static str {
    "Opal44 API is running!"
}

async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with("/api") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "API endpoint not found" })),
        )
            .into_response();
    }
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_json, body_text, get, test_app};
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let response = test_app(&server).oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Opal44 API is running!");
    }

    #[tokio::test]
    async fn test_unknown_api_route() {
        let server = MockServer::start().await;
        let response = test_app(&server).oneshot(get("/api/nope", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "API endpoint not found" }));
    }
}
