use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Analytics payload served to the dashboard and fed to the chat prompt.
///
/// Recomputed on every request from live GA4 calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResult {
    pub metrics: AnalyticsMetrics,
    pub chart_data: Vec<ChartPoint>,
    pub traffic_sources: Vec<TrafficSource>,
    pub country_data: Vec<CountryMetrics>,
    pub timestamp: DateTime<Utc>,
    pub date_range: DateRange,
}

/// Property-wide totals for the requested range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsMetrics {
    pub sessions: u64,
    pub users: u64,
    pub page_views: u64,
    pub bounce_rate: f64,
    /// Seconds.
    pub avg_session_duration: f64,
    pub conversions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub sessions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficSource {
    pub name: ChannelCategory,
    pub value: u64,
}

/// Dashboard traffic category a GA4 channel group folds into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelCategory {
    Organic,
    Social,
    Email,
    Direct,
    Referral,
    Unassigned,
    /// Label that matched no category, kept verbatim.
    Other(String),
}

impl ChannelCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ChannelCategory::Organic => "Organic",
            ChannelCategory::Social => "Social",
            ChannelCategory::Email => "Email",
            ChannelCategory::Direct => "Direct",
            ChannelCategory::Referral => "Referral",
            ChannelCategory::Unassigned => "Unassigned",
            ChannelCategory::Other(label) => label,
        }
    }
}

impl fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChannelCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryMetrics {
    pub country: String,
    pub sessions: u64,
    pub users: u64,
    pub page_views: u64,
    pub bounce_rate: f64,
    pub avg_session_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

/// GA4 property visible to the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga4Property {
    /// `properties/<numeric id>`
    pub id: String,
    pub display_name: String,
    pub account: String,
    pub account_display_name: String,
}

/// Query string of `GET /api/ga4/analytics`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub property_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Percentage change of each metric against an earlier period.
///
/// A metric is `None` when the earlier value was zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDeltas {
    pub sessions: Option<f64>,
    pub users: Option<f64>,
    pub page_views: Option<f64>,
    pub bounce_rate: Option<f64>,
    pub avg_session_duration: Option<f64>,
    pub conversions: Option<f64>,
}

// GA4 wire formats

/// Body of a Data API `runReport` response. Only the parts we read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportValue {
    #[serde(default)]
    pub value: Option<String>,
}

impl ReportRow {
    pub fn dimension(&self, index: usize) -> Option<&str> {
        self.dimension_values
            .get(index)
            .and_then(|v| v.value.as_deref())
    }

    /// Integer metric; missing or unparsable values read as 0.
    pub fn metric_u64(&self, index: usize) -> u64 {
        let raw = match self.metric_values.get(index).and_then(|v| v.value.as_deref()) {
            Some(raw) => raw.trim(),
            None => return 0,
        };
        if let Ok(value) = raw.parse::<u64>() {
            return value;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
            _ => 0,
        }
    }

    /// Rate or duration metric; missing or unparsable values read as 0.0.
    pub fn metric_f64(&self, index: usize) -> f64 {
        self.metric_values
            .get(index)
            .and_then(|v| v.value.as_deref())
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(0.0)
    }
}

/// Admin API `accountSummaries` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummariesResponse {
    #[serde(default)]
    pub account_summaries: Vec<AccountSummary>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub property_summaries: Vec<PropertySummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    #[serde(default)]
    pub property: String,
    #[serde(default)]
    pub display_name: String,
}
