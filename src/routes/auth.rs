use crate::{
    error::Result,
    models::oauth::SignInStage,
    state::AppState,
    utils::{
        cookies::{cleared_session_cookie, session_cookie},
        session_codec::encode_session,
    },
};
use ammonia::clean_text;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/oauth/google/redirect_url", get(redirect_url))
        .route("/auth/callback", get(callback))
        .route("/logout", get(logout))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// 获取 Google 登录地址
/// GET /api/oauth/google/redirect_url
pub async fn redirect_url(State(app_state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let url = app_state.oauth_service.build_authorization_url()?;
    debug!("Sign-in reached {}", SignInStage::RedirectIssued);
    Ok(Json(json!({ "redirectUrl": url })))
}

/// OAuth 回调
/// GET /api/auth/callback
///
/// Answers with a small HTML page rather than JSON: the browser lands here
/// directly from Google's consent screen.
pub async fn callback(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(oauth_error) = query.error {
        warn!("Google returned an OAuth error: {}", oauth_error);
        return error_page(
            StatusCode::BAD_REQUEST,
            "Authentication Error",
            &format!(
                "There was an error during the sign-in process: {}",
                clean_text(&oauth_error)
            ),
        );
    }

    let code = match query.code.filter(|code| !code.is_empty()) {
        Some(code) => code,
        None => {
            return error_page(
                StatusCode::BAD_REQUEST,
                "Missing Authorization Code",
                "No authorization code was received from Google.",
            )
        }
    };

    let session = match app_state.oauth_service.complete_sign_in(&code).await {
        Ok(session) => session,
        Err(e) => {
            error!("OAuth callback failed: {}", e);
            return sign_in_failed();
        }
    };

    let token = match encode_session(&session) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to encode session: {}", e);
            return sign_in_failed();
        }
    };

    info!("User {} signed in", session.email);
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, app_state.config.dashboard_url()),
            (header::SET_COOKIE, session_cookie(&token, app_state.is_production())),
        ],
    )
        .into_response()
}

/// 退出登录
/// GET /api/logout
pub async fn logout(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, cleared_session_cookie(app_state.is_production()))],
        Json(json!({ "success": true })),
    )
}

fn sign_in_failed() -> Response {
    error_page(
        StatusCode::BAD_GATEWAY,
        "Authentication Failed",
        "Failed to complete sign up. Please try again.",
    )
}

/// `message` must already be HTML-safe.
fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        r#"<div style="font-family: Arial, sans-serif; text-align: center; padding: 50px; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #dc2626;">{}</h2>
  <p style="color: #6b7280; margin: 20px 0;">{}</p>
  <a href="/signup" style="background: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 8px; display: inline-block;">Try Again</a>
</div>"#,
        title, message
    );
    (status, Html(body)).into_response()
}
