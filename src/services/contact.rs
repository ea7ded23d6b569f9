use crate::{
    config::Config,
    error::{AppError, Result},
    models::contact::ContactRequest,
};
use ammonia::clean_text;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

pub const CONTACT_SENT_MESSAGE: &str = "Thank you for your message! We'll get back to you soon.";
const CONTACT_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";

/// Relays contact-form submissions by e-mail through Resend.
#[derive(Clone)]
pub struct ContactService {
    config: Config,
    http_client: Client,
}

impl ContactService {
    pub fn new(config: &Config, http_client: Client) -> Self {
        Self {
            config: config.clone(),
            http_client,
        }
    }

    pub async fn send(&self, request: &ContactRequest) -> Result<()> {
        request.validate()?;

        let api_key = self
            .config
            .resend_api_key
            .as_deref()
            .ok_or_else(|| AppError::configuration("Resend API key not configured"))?;

        let payload = json!({
            "from": self.config.contact_sender,
            "to": [self.config.contact_recipient],
            "reply_to": request.email,
            "subject": request.email_subject(),
            "html": email_html(request),
            "text": request.email_text(),
        });

        let response = self
            .http_client
            .post(format!("{}/emails", self.config.resend_api_base))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Resend request failed: {}", e);
                AppError::upstream_internal(CONTACT_FAILED_MESSAGE, e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Resend returned {}: {}", status, body);
            return Err(AppError::upstream_internal(
                CONTACT_FAILED_MESSAGE,
                format!("Resend API error: {}", status),
            ));
        }

        info!("Contact message relayed for {}", request.email);
        Ok(())
    }
}

/// HTML body; every submitted field is escaped.
fn email_html(request: &ContactRequest) -> String {
    let heading = request
        .subject
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("New Contact Form Submission");

    let mut html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px;\">\
         <h2>{}</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>",
        clean_text(heading),
        clean_text(&request.name),
        clean_text(&request.email),
    );

    if let Some(company) = request.company.as_deref().filter(|c| !c.trim().is_empty()) {
        html.push_str(&format!("<p><strong>Company:</strong> {}</p>", clean_text(company)));
    }

    html.push_str(&format!(
        "<h3>Message:</h3><p style=\"white-space: pre-wrap;\">{}</p>\
         <p><strong>Reply to:</strong> {}</p></div>",
        clean_text(&request.message),
        clean_text(&request.email),
    ));
    html
}
