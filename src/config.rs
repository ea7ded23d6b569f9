use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Google OAuth configuration
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,

    // Google Analytics endpoints
    pub ga_admin_api_base: String,
    pub ga_data_api_base: String,

    // Public URLs
    pub public_base_url: String,
    pub frontend_url: String,

    // Chat assistant
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub openai_model: String,

    // Contact form
    pub resend_api_key: Option<String>,
    pub resend_api_base: String,
    pub contact_recipient: String,
    pub contact_sender: String,

    // Outbound HTTP
    pub http_timeout_secs: u64,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "opal44=debug,tower_http=debug".to_string()),

            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            google_auth_url: env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
            google_userinfo_url: env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v2/userinfo".to_string()),

            ga_admin_api_base: env::var("GA_ADMIN_API_BASE")
                .unwrap_or_else(|_| "https://analyticsadmin.googleapis.com/v1beta".to_string()),
            ga_data_api_base: env::var("GA_DATA_API_BASE")
                .unwrap_or_else(|_| "https://analyticsdata.googleapis.com/v1beta".to_string()),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),

            resend_api_key: non_empty_var("RESEND_API_KEY"),
            resend_api_base: env::var("RESEND_API_BASE")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            contact_recipient: env::var("CONTACT_RECIPIENT")
                .unwrap_or_else(|_| "hello@opal44.com".to_string()),
            contact_sender: env::var("CONTACT_SENDER")
                .unwrap_or_else(|_| "Opal44 Contact Form <noreply@opal44.com>".to_string()),

            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// OAuth redirect URI registered with Google.
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/api/auth/callback", self.public_base_url.trim_end_matches('/'))
    }

    /// Where the browser lands after a successful sign-in.
    pub fn dashboard_url(&self) -> String {
        format!("{}/dashboard", self.frontend_url.trim_end_matches('/'))
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
impl Config {
    /// Development defaults with every upstream pointed at `upstream_base`.
    pub fn for_tests(upstream_base: &str) -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            google_client_id: Some("test-client-id".to_string()),
            google_client_secret: Some("test-client-secret".to_string()),
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: format!("{}/token", upstream_base),
            google_userinfo_url: format!("{}/userinfo", upstream_base),
            ga_admin_api_base: format!("{}/admin", upstream_base),
            ga_data_api_base: format!("{}/data", upstream_base),
            public_base_url: "http://localhost:3000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            openai_api_key: Some("test-openai-key".to_string()),
            openai_api_base: format!("{}/openai", upstream_base),
            openai_model: "gpt-3.5-turbo".to_string(),
            resend_api_key: Some("test-resend-key".to_string()),
            resend_api_base: format!("{}/resend", upstream_base),
            contact_recipient: "owner@example.com".to_string(),
            contact_sender: "Contact <noreply@example.com>".to_string(),
            http_timeout_secs: 5,
            cors_allowed_origins: "http://localhost:5173".to_string(),
        }
    }
}
