use serde::{Deserialize, Serialize};
use std::fmt;

/// Google's token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
}

/// Google userinfo (v2) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub picture: String,
}

/// Steps of the sign-in flow, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStage {
    RedirectIssued,
    CodeReceived,
    TokenExchanged,
    UserFetched,
    Ga4AccessChecked,
    SessionCreated,
}

impl fmt::Display for SignInStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignInStage::RedirectIssued => "redirect-issued",
            SignInStage::CodeReceived => "code-received",
            SignInStage::TokenExchanged => "token-exchanged",
            SignInStage::UserFetched => "user-fetched",
            SignInStage::Ga4AccessChecked => "ga4-access-checked",
            SignInStage::SessionCreated => "session-created",
        };
        f.write_str(name)
    }
}
