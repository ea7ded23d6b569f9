use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        analytics::{AnalyticsMetrics, AnalyticsResult},
        chat::{ChatRequest, ChatResponse},
        session::UserSession,
    },
    services::ga4::Ga4Service,
    utils::{
        ga4_report::parse_iso_date,
        period::{metric_deltas, month_windows, previous_period},
    },
};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{debug, info, warn};
use validator::Validate;

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;
const NO_RESPONSE: &str = "No response generated";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionContent>,
}

#[derive(Debug, Deserialize)]
struct CompletionContent {
    #[serde(default)]
    content: Option<String>,
}

/// Window the selected range is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonWindow {
    pub label: &'static str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// The window comes after the selected range, so deltas run from the
    /// selected range to this one.
    pub follows_selected: bool,
}

/// Answers questions about a property's analytics through a chat-completion API.
#[derive(Clone)]
pub struct ChatService {
    config: Config,
    http_client: Client,
    ga4: Ga4Service,
}

impl ChatService {
    pub fn new(config: &Config, http_client: Client, ga4: Ga4Service) -> Self {
        Self {
            config: config.clone(),
            http_client,
            ga4,
        }
    }

    pub async fn answer(&self, session: &UserSession, request: &ChatRequest) -> Result<ChatResponse> {
        request.validate()?;

        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| AppError::configuration("OpenAI API key not configured"))?;

        let current = self
            .ga4
            .fetch_analytics(
                &session.access_token,
                &request.property_id,
                &request.start_date,
                &request.end_date,
            )
            .await
            .map_err(|e| AppError::upstream_internal("Failed to get AI response", e.to_string()))?;

        let comparison = match comparison_window(request, Utc::now().date_naive()) {
            Some(window) => self.fetch_comparison(session, request, window).await,
            None => None,
        };

        let system_prompt = build_system_prompt(request, &current, comparison.as_ref());
        debug!("Chat prompt for {} is {} chars", request.property_id, system_prompt.len());

        let answer = self.complete(api_key, &system_prompt, &request.question).await?;
        info!("Chat answered for {}", session.email);

        Ok(ChatResponse { answer })
    }

    async fn fetch_comparison(
        &self,
        session: &UserSession,
        request: &ChatRequest,
        window: ComparisonWindow,
    ) -> Option<(ComparisonWindow, AnalyticsResult)> {
        let start = window.start.format("%Y-%m-%d").to_string();
        let end = window.end.format("%Y-%m-%d").to_string();

        match self
            .ga4
            .fetch_analytics(&session.access_token, &request.property_id, &start, &end)
            .await
        {
            Ok(result) => Some((window, result)),
            Err(e) => {
                warn!("Comparison data unavailable ({} to {}): {}", start, end, e);
                None
            }
        }
    }

    async fn complete(&self, api_key: &str, system_prompt: &str, question: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.openai_api_base);
        let body = CompletionRequest {
            model: &self.config.openai_model,
            messages: vec![
                CompletionMessage { role: "system", content: system_prompt },
                CompletionMessage { role: "user", content: question },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream_internal("Failed to get AI response", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("OpenAI API error: {}", status));
            return Err(AppError::upstream_internal("Failed to get AI response", details));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream_internal("Failed to get AI response", e.to_string()))?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string()))
    }
}

/// This month against last month when the user asks for that comparison
/// while one of the two months is selected, otherwise the equally long
/// window just before the selected range.
///
/// A month comparison under a label naming neither month has nothing to
/// compare with.
pub fn comparison_window(request: &ChatRequest, today: NaiveDate) -> Option<ComparisonWindow> {
    let question = request.question.to_lowercase();
    let asks_month_comparison = question.contains("compare")
        && (question.contains("this month") || question.contains("last month"));

    let label = request
        .date_range_label
        .as_deref()
        .filter(|label| !label.is_empty())
        .map(str::to_lowercase);

    if let (true, Some(label)) = (asks_month_comparison, label) {
        let months = month_windows(today);
        if label.contains("this month") {
            let (start, end) = months.last_month;
            return Some(ComparisonWindow { label: "Last month", start, end, follows_selected: false });
        }
        if label.contains("last month") {
            let (start, end) = months.this_month;
            return Some(ComparisonWindow { label: "This month", start, end, follows_selected: true });
        }
        return None;
    }

    let start = parse_iso_date(&request.start_date)?;
    let end = parse_iso_date(&request.end_date)?;
    let (start, end) = previous_period(start, end);
    Some(ComparisonWindow { label: "Previous period", start, end, follows_selected: false })
}

fn write_metrics(prompt: &mut String, metrics: &AnalyticsMetrics) {
    let _ = writeln!(prompt, "Sessions: {}", metrics.sessions);
    let _ = writeln!(prompt, "Users: {}", metrics.users);
    let _ = writeln!(prompt, "Pageviews: {}", metrics.page_views);
    let _ = writeln!(prompt, "Bounce Rate: {:.2}%", metrics.bounce_rate * 100.0);
    let _ = writeln!(
        prompt,
        "Average Session Duration: {:.2} minutes",
        metrics.avg_session_duration / 60.0
    );
    let _ = writeln!(prompt, "Conversions: {}", metrics.conversions);
}

fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(value) => format!("{:+.1}%", value),
        None => "n/a".to_string(),
    }
}

pub fn build_system_prompt(
    request: &ChatRequest,
    current: &AnalyticsResult,
    comparison: Option<&(ComparisonWindow, AnalyticsResult)>,
) -> String {
    let mut prompt = String::from(
        "You are a GA4 (Google Analytics 4) analytics assistant. Answer using only the real data below.\n\n",
    );

    let _ = writeln!(prompt, "Property: {}", request.property_id);
    let _ = writeln!(prompt, "Date range: {} to {}", request.start_date, request.end_date);
    if let Some(label) = request.date_range_label.as_deref().filter(|l| !l.is_empty()) {
        let _ = writeln!(prompt, "Selected range: {}", label);
    }

    prompt.push_str("\nOverall Metrics:\n");
    write_metrics(&mut prompt, &current.metrics);

    prompt.push_str("\nTraffic Sources (sessions by channel):\n");
    if current.traffic_sources.is_empty() {
        prompt.push_str("No channel data available\n");
    }
    for source in &current.traffic_sources {
        let _ = writeln!(prompt, "- {}: {}", source.name, source.value);
    }

    prompt.push_str("\nTop Countries:\n");
    if current.country_data.is_empty() {
        prompt.push_str("No country data available\n");
    }
    for country in &current.country_data {
        let _ = writeln!(
            prompt,
            "- {}: {} sessions, {} users, {} pageviews",
            country.country, country.sessions, country.users, country.page_views
        );
    }

    if let Some((window, other)) = comparison {
        let _ = writeln!(
            prompt,
            "\n{} ({} to {}):",
            window.label,
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d")
        );
        write_metrics(&mut prompt, &other.metrics);

        let deltas = if window.follows_selected {
            prompt.push_str("\nChange from the selected range to this window:\n");
            metric_deltas(&other.metrics, &current.metrics)
        } else {
            prompt.push_str("\nChange vs comparison period:\n");
            metric_deltas(&current.metrics, &other.metrics)
        };
        let _ = writeln!(prompt, "Sessions: {}", format_delta(deltas.sessions));
        let _ = writeln!(prompt, "Users: {}", format_delta(deltas.users));
        let _ = writeln!(prompt, "Pageviews: {}", format_delta(deltas.page_views));
        let _ = writeln!(prompt, "Bounce Rate: {}", format_delta(deltas.bounce_rate));
        let _ = writeln!(prompt, "Average Session Duration: {}", format_delta(deltas.avg_session_duration));
        let _ = writeln!(prompt, "Conversions: {}", format_delta(deltas.conversions));
    }

    prompt.push_str(
        "\nRules:\n\
         1. Start every answer with \"🤖 AI Assistant:\".\n\
         2. Never invent pages, countries or figures that are not listed above; say what the data does cover instead.\n\
         3. Use numbered lists, percentages and short actionable insights.\n\
         4. If the question is unrelated to web analytics, reply: \"I cannot answer your question because it is not related to GA4 analytics. Please ask me about GA4 data and I will help you.\"\n",
    );

    prompt
}
