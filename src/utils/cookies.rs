use crate::models::session::{SESSION_COOKIE_NAME, SESSION_MAX_AGE_SECS};

/// `Set-Cookie` value carrying an encoded session token.
pub fn session_cookie(token: &str, production: bool) -> String {
    format!(
        "{}={}; {}; Max-Age={}",
        SESSION_COOKIE_NAME,
        token,
        cookie_attributes(production),
        SESSION_MAX_AGE_SECS
    )
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn cleared_session_cookie(production: bool) -> String {
    format!(
        "{}=; {}; Max-Age=0",
        SESSION_COOKIE_NAME,
        cookie_attributes(production)
    )
}

fn cookie_attributes(production: bool) -> &'static str {
    if production {
        "HttpOnly; Path=/; SameSite=None; Secure"
    } else {
        "HttpOnly; Path=/; SameSite=Lax"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_cookie() {
        assert_eq!(
            session_cookie("abc", false),
            "opal44_session=abc; HttpOnly; Path=/; SameSite=Lax; Max-Age=5184000"
        );
    }

    #[test]
    fn test_production_cookie_is_cross_site() {
        let cookie = session_cookie("abc", true);
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_cleared_cookie() {
        assert_eq!(
            cleared_session_cookie(false),
            "opal44_session=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"
        );
        assert!(cleared_session_cookie(true).ends_with("Secure; Max-Age=0"));
    }
}
