use crate::{
    config::Config,
    error::{AppError, Result, UpstreamError},
    models::{
        oauth::{GoogleUserInfo, SignInStage, TokenResponse},
        session::{UserSession, SESSION_COOKIE_NAME},
    },
    utils::session_codec::decode_session,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    headers::Cookie,
    http::request::Parts,
    TypedHeader,
};
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

const OAUTH_SCOPES: &str =
    "openid email profile https://www.googleapis.com/auth/analytics.readonly";

/// Drives Google's authorization-code flow.
#[derive(Clone)]
pub struct GoogleOAuthService {
    config: Config,
    http_client: Client,
}

impl GoogleOAuthService {
    pub fn new(config: &Config, http_client: Client) -> Self {
        Self {
            config: config.clone(),
            http_client,
        }
    }

    fn client_id(&self) -> Result<&str> {
        self.config
            .google_client_id
            .as_deref()
            .ok_or_else(|| AppError::configuration("Google client ID not configured"))
    }

    fn client_secret(&self) -> Result<&str> {
        self.config
            .google_client_secret
            .as_deref()
            .ok_or_else(|| AppError::configuration("Google client secret not configured"))
    }

    /// Consent-screen URL. `access_type=offline` with `prompt=consent` makes
    /// Google issue a refresh token on every login.
    pub fn build_authorization_url(&self) -> Result<String> {
        let redirect_uri = self.config.oauth_redirect_uri();
        let url = Url::parse_with_params(
            &self.config.google_auth_url,
            &[
                ("client_id", self.client_id()?),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AppError::Configuration(format!("Invalid Google auth URL: {}", e)))?;

        Ok(url.into())
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let redirect_uri = self.config.oauth_redirect_uri();
        let form = [
            ("client_id", self.client_id()?),
            ("client_secret", self.client_secret()?),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.google_token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| sign_in_error(SignInStage::CodeReceived, e.into()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Google token endpoint returned {}", status);
            return Err(sign_in_error(
                SignInStage::CodeReceived,
                UpstreamError::status(status, format!("Failed to exchange code for token: {}", body)),
            ));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| sign_in_error(SignInStage::CodeReceived, e.into()))
    }

    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo> {
        let response = self
            .http_client
            .get(&self.config.google_userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| sign_in_error(SignInStage::TokenExchanged, e.into()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Google userinfo endpoint returned {}", status);
            return Err(sign_in_error(
                SignInStage::TokenExchanged,
                UpstreamError::status(status, format!("Failed to get user info: {}", body)),
            ));
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| sign_in_error(SignInStage::TokenExchanged, e.into()))
    }

    /// Soft probe: any failure means "no access".
    pub async fn check_ga4_access(&self, access_token: &str) -> bool {
        let url = format!("{}/accountSummaries", self.config.ga_admin_api_base);
        match self.http_client.get(&url).bearer_auth(access_token).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                if !ok {
                    debug!("GA4 access probe returned {}", response.status());
                }
                ok
            }
            Err(e) => {
                warn!("GA4 access verification failed: {}", e);
                false
            }
        }
    }

    /// Runs the callback half of the flow and builds the session.
    pub async fn complete_sign_in(&self, code: &str) -> Result<UserSession> {
        debug!("Sign-in reached {}", SignInStage::CodeReceived);

        let tokens = self.exchange_code(code).await?;
        debug!("Sign-in reached {}", SignInStage::TokenExchanged);

        let user_info = self.fetch_user_info(&tokens.access_token).await?;
        debug!("Sign-in reached {}", SignInStage::UserFetched);

        let has_ga4_access = self.check_ga4_access(&tokens.access_token).await;
        debug!("Sign-in reached {} (access: {})", SignInStage::Ga4AccessChecked, has_ga4_access);

        let session = UserSession {
            id: user_info.id,
            email: user_info.email,
            name: user_info.name,
            picture: user_info.picture,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: expiry_millis(Utc::now().timestamp_millis(), tokens.expires_in),
            has_ga4_access,
        };

        info!("Sign-in reached {} for {}", SignInStage::SessionCreated, session.email);
        Ok(session)
    }
}

/// Absolute expiry for a token valid for `expires_in` seconds.
fn expiry_millis(now_ms: i64, expires_in: i64) -> i64 {
    now_ms.saturating_add(expires_in.saturating_mul(1000))
}

fn sign_in_error(stage: SignInStage, source: UpstreamError) -> AppError {
    AppError::UpstreamAuth {
        stage,
        message: source.to_string(),
    }
}

/// Session decoded from the request's cookie.
///
/// Rejects with 401 when the cookie is missing, undecodable or expired.
pub struct AuthenticatedSession(pub UserSession);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let cookies = TypedHeader::<Cookie>::from_request_parts(parts, state)
            .await
            .ok();

        let token = cookies
            .as_ref()
            .and_then(|TypedHeader(cookies)| cookies.get(SESSION_COOKIE_NAME))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;

        let session = decode_session(token)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired session"))?;

        if session.access_token.is_empty() {
            return Err(AppError::unauthorized("No access token found"));
        }

        Ok(AuthenticatedSession(session))
    }
}
