use crate::{
    error::{AppError, Result},
    models::analytics::{AnalyticsQuery, AnalyticsResult},
    services::AuthenticatedSession,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

const PROPERTIES_HINT: &str = "Make sure you have granted Analytics access during sign-in";
const ANALYTICS_HINT: &str = "Make sure the property ID is correct and you have access to it";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/properties", get(list_properties))
        .route("/analytics", get(get_analytics))
}

/// 获取 GA4 属性列表
/// GET /api/ga4/properties
pub async fn list_properties(
    State(app_state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Result<Json<Value>> {
    debug!("Listing GA4 properties for {}", session.email);

    let properties = app_state
        .ga4_service
        .list_properties(&session.access_token)
        .await
        .map_err(|e| AppError::upstream("Failed to fetch GA4 properties", &e, Some(PROPERTIES_HINT)))?;

    Ok(Json(json!({ "properties": properties })))
}

/// 获取 GA4 统计数据
/// GET /api/ga4/analytics?propertyId=&startDate=&endDate=
pub async fn get_analytics(
    State(app_state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResult>> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let (property_id, start_date, end_date) = match (
        non_empty(query.property_id),
        non_empty(query.start_date),
        non_empty(query.end_date),
    ) {
        (Some(property_id), Some(start_date), Some(end_date)) => (property_id, start_date, end_date),
        _ => {
            return Err(AppError::validation(
                "Missing required parameters",
                "propertyId, startDate, and endDate are required",
            ))
        }
    };

    let result = app_state
        .ga4_service
        .fetch_analytics(&session.access_token, &property_id, &start_date, &end_date)
        .await
        .map_err(|e| AppError::upstream("Failed to fetch GA4 analytics data", &e, Some(ANALYTICS_HINT)))?;

    info!(
        "Served analytics for {}: {} sessions, {} chart points",
        property_id,
        result.metrics.sessions,
        result.chart_data.len()
    );
    Ok(Json(result))
}
