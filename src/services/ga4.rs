use crate::{
    config::Config,
    error::UpstreamError,
    models::analytics::{
        AccountSummariesResponse, AnalyticsResult, CountryMetrics, DateRange, Ga4Property,
        RunReportResponse, TrafficSource,
    },
    utils::ga4_report::{
        aggregate_metrics, aggregate_traffic_sources, country_rows, daily_series,
        normalize_property_id,
    },
};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

const AGGREGATE_METRICS: [&str; 6] = [
    "sessions",
    "totalUsers",
    "screenPageViews",
    "bounceRate",
    "averageSessionDuration",
    "conversions",
];

const COUNTRY_METRICS: [&str; 5] = [
    "sessions",
    "totalUsers",
    "screenPageViews",
    "bounceRate",
    "averageSessionDuration",
];

const TRAFFIC_SOURCE_LIMIT: u32 = 10;
const COUNTRY_LIMIT: u32 = 20;

/// Client for the GA4 Admin and Data APIs.
#[derive(Clone)]
pub struct Ga4Service {
    config: Config,
    http_client: Client,
}

pub type Ga4Result<T> = std::result::Result<T, UpstreamError>;

impl Ga4Service {
    pub fn new(config: &Config, http_client: Client) -> Self {
        Self {
            config: config.clone(),
            http_client,
        }
    }

    /// Every property across the user's accounts.
    pub async fn list_properties(&self, access_token: &str) -> Ga4Result<Vec<Ga4Property>> {
        let url = format!("{}/accountSummaries", self.config.ga_admin_api_base);
        let mut properties = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http_client.get(&url).bearer_auth(access_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                error!("GA4 Admin API returned {}", status);
                return Err(UpstreamError::status(
                    status,
                    format!("GA4 API Error ({}): {}", status, upstream_message(&body)),
                ));
            }

            let page: AccountSummariesResponse = response.json().await?;
            for account in page.account_summaries {
                for property in account.property_summaries {
                    properties.push(Ga4Property {
                        id: property.property,
                        display_name: property.display_name,
                        account: account.account.clone(),
                        account_display_name: account.display_name.clone(),
                    });
                }
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Fetched {} GA4 properties", properties.len());
        Ok(properties)
    }

    /// Full dashboard payload for one property and date range.
    ///
    /// Totals and the daily series come from two separate reports: asking
    /// for the date dimension alongside the totals splits the totals per day
    /// and user counts no longer add up. Both are required; the traffic and
    /// country breakdowns degrade to empty lists.
    pub async fn fetch_analytics(
        &self,
        access_token: &str,
        property_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Ga4Result<AnalyticsResult> {
        let property = normalize_property_id(property_id);
        let range = DateRange::new(start_date, end_date);
        info!("Fetching GA4 analytics for {} from {} to {}", property, start_date, end_date);

        let aggregate = self
            .run_report(access_token, &property, aggregate_request(&range))
            .await?;
        let metrics = aggregate_metrics(&aggregate);
        debug!("Aggregate metrics for {}: {:?}", property, metrics);

        let daily = self
            .run_report(access_token, &property, daily_request(&range))
            .await?;
        let chart_data = daily_series(&daily.rows, &range);
        debug!("Daily rows for {}: {} -> {} chart points", property, daily.rows.len(), chart_data.len());

        let traffic_sources = self.fetch_traffic_sources(access_token, &property, &range).await;
        let country_data = self.fetch_country_data(access_token, &property, &range).await;

        Ok(AnalyticsResult {
            metrics,
            chart_data,
            traffic_sources,
            country_data,
            timestamp: Utc::now(),
            date_range: range,
        })
    }

    async fn fetch_traffic_sources(
        &self,
        access_token: &str,
        property: &str,
        range: &DateRange,
    ) -> Vec<TrafficSource> {
        match self
            .run_report(access_token, property, traffic_sources_request(range))
            .await
        {
            Ok(report) => {
                let sources = aggregate_traffic_sources(&report.rows);
                debug!("Extracted {} traffic sources", sources.len());
                sources
            }
            Err(e) => {
                warn!("Traffic sources unavailable for {}: {}", property, e);
                Vec::new()
            }
        }
    }

    async fn fetch_country_data(
        &self,
        access_token: &str,
        property: &str,
        range: &DateRange,
    ) -> Vec<CountryMetrics> {
        match self
            .run_report(access_token, property, country_request(range))
            .await
        {
            Ok(report) => {
                let countries = country_rows(&report.rows);
                debug!("Extracted {} countries", countries.len());
                countries
            }
            Err(e) => {
                warn!("Country data unavailable for {}: {}", property, e);
                Vec::new()
            }
        }
    }

    async fn run_report(
        &self,
        access_token: &str,
        property: &str,
        body: Value,
    ) -> Ga4Result<RunReportResponse> {
        let url = format!("{}/{}:runReport", self.config.ga_data_api_base, property);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(status, friendly_error_message(status, &text)));
        }

        Ok(response.json::<RunReportResponse>().await?)
    }
}

fn metric_list(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|name| json!({ "name": name })).collect())
}

fn date_ranges(range: &DateRange) -> Value {
    json!([{ "startDate": range.start_date, "endDate": range.end_date }])
}

fn aggregate_request(range: &DateRange) -> Value {
    json!({
        "dateRanges": date_ranges(range),
        "dimensions": [],
        "metrics": metric_list(&AGGREGATE_METRICS),
    })
}

fn daily_request(range: &DateRange) -> Value {
    json!({
        "dateRanges": date_ranges(range),
        "dimensions": [{ "name": "date" }],
        "metrics": [{ "name": "sessions" }],
        "orderBys": [{ "dimension": { "dimensionName": "date" }, "desc": false }],
        "keepEmptyRows": true,
    })
}

fn traffic_sources_request(range: &DateRange) -> Value {
    json!({
        "dateRanges": date_ranges(range),
        "dimensions": [{ "name": "sessionDefaultChannelGroup" }],
        "metrics": [{ "name": "sessions" }],
        "orderBys": [{ "metric": { "metricName": "sessions" }, "desc": true }],
        "limit": TRAFFIC_SOURCE_LIMIT,
    })
}

fn country_request(range: &DateRange) -> Value {
    json!({
        "dateRanges": date_ranges(range),
        "dimensions": [{ "name": "country" }],
        "metrics": metric_list(&COUNTRY_METRICS),
        "orderBys": [{ "metric": { "metricName": "sessions" }, "desc": true }],
        "limit": COUNTRY_LIMIT,
    })
}

/// `error.message` of a Google error body, or the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Error text for a failed Data API call, always naming the status.
pub fn friendly_error_message(status: u16, body: &str) -> String {
    let message = upstream_message(body);
    let detail = match status {
        429 if message.contains("denied access") => {
            "This property does not have access to the GA4 Reporting API. Please enable the Google Analytics Data API in your Google Cloud Console for this property.".to_string()
        }
        429 => "Rate limit exceeded. Please try again later.".to_string(),
        403 => "Access denied to this GA4 property. Please make sure you have the necessary permissions.".to_string(),
        404 => "GA4 property not found. Please check the property ID.".to_string(),
        _ => message,
    };
    format!("GA4 Analytics API Error ({}): {}", status, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path},
        Match, Mock, MockServer, Request, ResponseTemplate,
    };

    /// Matches a runReport body by its dimension names.
    struct Dimensions(&'static [&'static str]);

    impl Match for Dimensions {
        fn matches(&self, request: &Request) -> bool {
            let body: Value = match serde_json::from_slice(&request.body) {
                Ok(body) => body,
                Err(_) => return false,
            };
            let names: Vec<&str> = body["dimensions"]
                .as_array()
                .map(|dims| dims.iter().filter_map(|d| d["name"].as_str()).collect())
                .unwrap_or_default();
            names == self.0
        }
    }

    fn service(server: &MockServer) -> Ga4Service {
        Ga4Service::new(&Config::for_tests(&server.uri()), Client::new())
    }

    fn report_path() -> wiremock::matchers::PathExactMatcher {
        path("/data/properties/123:runReport")
    }

    async fn mount_primary_reports(server: &MockServer) {
        Mock::given(method("POST"))
            .and(report_path())
            .and(Dimensions(&[]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": [{
                    "metricValues": [
                        { "value": "120" }, { "value": "90" }, { "value": "300" },
                        { "value": "0.48" }, { "value": "75.5" }, { "value": "4" }
                    ]
                }]
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(report_path())
            .and(Dimensions(&["date"]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": [
                    { "dimensionValues": [{ "value": "20240101" }], "metricValues": [{ "value": "40" }] },
                    { "dimensionValues": [{ "value": "20240102" }], "metricValues": [{ "value": "50" }] },
                    { "dimensionValues": [{ "value": "20240103" }], "metricValues": [{ "value": "30" }] }
                ]
            })))
            .mount(server)
            .await;
    }

    async fn mount_country_report(server: &MockServer) {
        Mock::given(method("POST"))
            .and(report_path())
            .and(Dimensions(&["country"]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": [
                    {
                        "dimensionValues": [{ "value": "(not set)" }],
                        "metricValues": [{ "value": "12" }, { "value": "12" }, { "value": "12" }, { "value": "1" }, { "value": "0" }]
                    },
                    {
                        "dimensionValues": [{ "value": "Canada" }],
                        "metricValues": [{ "value": "10" }, { "value": "8" }, { "value": "22" }, { "value": "0.4" }, { "value": "80" }]
                    }
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_aggregate_and_daily_are_fetched_separately() {
        let server = MockServer::start().await;
        mount_primary_reports(&server).await;
        mount_country_report(&server).await;

        Mock::given(method("POST"))
            .and(report_path())
            .and(Dimensions(&["sessionDefaultChannelGroup"]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": [
                    { "dimensionValues": [{ "value": "Organic Search" }], "metricValues": [{ "value": "70" }] },
                    { "dimensionValues": [{ "value": "Paid Social" }], "metricValues": [{ "value": "30" }] },
                    { "dimensionValues": [{ "value": "Organic Social" }], "metricValues": [{ "value": "20" }] }
                ]
            })))
            .mount(&server)
            .await;

        let result = service(&server)
            .fetch_analytics("token", "123", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        assert_eq!(result.metrics.sessions, 120);
        assert_eq!(result.metrics.users, 90);
        assert_eq!(result.metrics.conversions, 4);
        assert_eq!(result.chart_data.len(), 3);
        assert_eq!(result.chart_data[0].date, "2024-01-01");
        assert_eq!(result.chart_data[1].sessions, 50);

        let sources: Vec<(String, u64)> = result
            .traffic_sources
            .iter()
            .map(|s| (s.name.to_string(), s.value))
            .collect();
        assert_eq!(sources, vec![("Organic".to_string(), 70), ("Social".to_string(), 50)]);

        assert_eq!(result.country_data.len(), 1);
        assert_eq!(result.country_data[0].country, "Canada");
        assert_eq!(result.country_data[0].sessions, 10);
        assert_eq!(result.date_range, DateRange::new("2024-01-01", "2024-01-03"));
    }

    #[tokio::test]
    async fn test_traffic_source_failure_is_isolated() {
        let server = MockServer::start().await;
        mount_primary_reports(&server).await;
        mount_country_report(&server).await;

        Mock::given(method("POST"))
            .and(report_path())
            .and(Dimensions(&["sessionDefaultChannelGroup"]))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let result = service(&server)
            .fetch_analytics("token", "properties/123", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        assert!(result.traffic_sources.is_empty());
        assert_eq!(result.metrics.sessions, 120);
        assert_eq!(result.chart_data.len(), 3);
        assert_eq!(result.country_data.len(), 1);
    }

    #[tokio::test]
    async fn test_country_failure_is_isolated() {
        let server = MockServer::start().await;
        mount_primary_reports(&server).await;
        // No country or traffic mocks: wiremock answers 404 for both.

        let result = service(&server)
            .fetch_analytics("token", "123", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        assert!(result.country_data.is_empty());
        assert!(result.traffic_sources.is_empty());
        assert_eq!(result.metrics.sessions, 120);
    }

    #[tokio::test]
    async fn test_aggregate_failure_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(report_path())
            .and(Dimensions(&[]))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "User does not have sufficient permissions", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let err = service(&server)
            .fetch_analytics("token", "123", "2024-01-01", "2024-01-03")
            .await
            .unwrap_err();

        assert_eq!(err.inferred_status(), axum::http::StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("(403)"));
        assert!(err.to_string().contains("Access denied"));
    }

    #[tokio::test]
    async fn test_list_properties_flattens_accounts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/accountSummaries"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accountSummaries": [
                    {
                        "account": "accounts/1",
                        "displayName": "Acme",
                        "propertySummaries": [
                            { "property": "properties/11", "displayName": "Acme Web" },
                            { "property": "properties/12", "displayName": "Acme App" }
                        ]
                    },
                    { "account": "accounts/2", "displayName": "Empty" }
                ]
            })))
            .mount(&server)
            .await;

        let properties = service(&server).list_properties("token").await.unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[1].id, "properties/12");
        assert_eq!(properties[1].display_name, "Acme App");
        assert_eq!(properties[1].account, "accounts/1");
        assert_eq!(properties[1].account_display_name, "Acme");
    }

    #[tokio::test]
    async fn test_list_properties_error_embeds_upstream_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/accountSummaries"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "code": 401, "message": "Request had invalid authentication credentials." }
            })))
            .mount(&server)
            .await;

        let err = service(&server).list_properties("token").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "GA4 API Error (401): Request had invalid authentication credentials."
        );
    }

    #[test]
    fn test_friendly_error_message() {
        let denied = r#"{"error":{"message":"This property has been denied access to the API"}}"#;
        assert!(friendly_error_message(429, denied).contains("Google Analytics Data API"));
        assert!(friendly_error_message(429, "{}").contains("Rate limit exceeded"));
        assert!(friendly_error_message(404, "").contains("property not found"));
        assert_eq!(
            friendly_error_message(500, r#"{"error":{"message":"Internal error encountered."}}"#),
            "GA4 Analytics API Error (500): Internal error encountered."
        );
        assert_eq!(friendly_error_message(400, "plain text"), "GA4 Analytics API Error (400): plain text");
    }
}
