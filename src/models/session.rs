use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the encoded session.
pub const SESSION_COOKIE_NAME: &str = "opal44_session";

/// Cookie lifetime: 60 days.
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 24 * 60 * 60;

/// Signed-in user, held only in the client's cookie.
///
/// Created once the OAuth callback completes and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Epoch milliseconds.
    pub expires_at: i64,
    #[serde(rename = "hasGA4Access")]
    pub has_ga4_access: bool,
}

impl UserSession {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
            has_ga4_access: self.has_ga4_access,
        }
    }
}

/// Identity returned to the browser; tokens stay out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: String,
    #[serde(rename = "hasGA4Access")]
    pub has_ga4_access: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UserSession {
        UserSession {
            id: "1234".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            picture: "https://example.com/ada.png".to_string(),
            access_token: "ya29.token".to_string(),
            refresh_token: None,
            expires_at: 1_000,
            has_ga4_access: true,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(session()).unwrap();
        assert_eq!(value["accessToken"], "ya29.token");
        assert_eq!(value["expiresAt"], 1_000);
        assert_eq!(value["hasGA4Access"], true);
        assert!(value.get("refreshToken").is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let session = session();
        assert!(!session.is_expired_at(999));
        assert!(!session.is_expired_at(1_000));
        assert!(session.is_expired_at(1_001));
    }

    #[test]
    fn test_public_view_drops_tokens() {
        let value = serde_json::to_value(session().to_public()).unwrap();
        assert!(value.get("accessToken").is_none());
        assert_eq!(value["email"], "ada@example.com");
    }
}
