use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Question is required"))]
    pub question: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Property ID is required"))]
    pub property_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Start date is required"))]
    pub start_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "End date is required"))]
    pub end_date: String,
    /// Label of the dashboard's date preset, e.g. "This month".
    #[serde(default)]
    pub date_range_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}
