//! Cookie encoding of [`UserSession`].
//!
//! The session is serialized to JSON, every character is moved one Unicode
//! scalar value forward, and the result is percent-encoded. This is
//! obfuscation only: anyone holding the cookie can read and forge it.
// TODO: replace the character shift with an HMAC-signed (or encrypted) token
// once we can rotate existing cookies; today a forged cookie is accepted.

use chrono::Utc;
use tracing::debug;

use crate::{error::Result, models::session::UserSession};

/// Serializes `session` into a cookie-safe token.
pub fn encode_session(session: &UserSession) -> Result<String> {
    let json = serde_json::to_string(session)?;
    let shifted: String = json.chars().map(shift_forward).collect();
    Ok(urlencoding::encode(&shifted).into_owned())
}

/// Decodes a token against the current clock.
///
/// Returns `None` for anything that is not a live session.
pub fn decode_session(token: &str) -> Option<UserSession> {
    decode_session_at(token, Utc::now().timestamp_millis())
}

pub fn decode_session_at(token: &str, now_ms: i64) -> Option<UserSession> {
    let shifted = match urlencoding::decode(token) {
        Ok(text) => text,
        Err(_) => {
            debug!("Session token is not valid percent-encoded UTF-8");
            return None;
        }
    };
    let json: String = shifted.chars().map(shift_back).collect();

    let session: UserSession = match serde_json::from_str(&json) {
        Ok(session) => session,
        Err(e) => {
            debug!("Session token did not parse: {}", e);
            return None;
        }
    };

    if session.is_expired_at(now_ms) {
        debug!("Session expired at {} (now {})", session.expires_at, now_ms);
        return None;
    }

    Some(session)
}

// Successor over Unicode scalar values, wrapping around the surrogate gap
// and the end of the range so that every char has exactly one image.
fn shift_forward(c: char) -> char {
    match c {
        '\u{D7FF}' => '\u{E000}',
        char::MAX => '\u{0}',
        _ => char::from_u32(c as u32 + 1).unwrap_or(c),
    }
}

fn shift_back(c: char) -> char {
    match c {
        '\u{E000}' => '\u{D7FF}',
        '\u{0}' => char::MAX,
        _ => char::from_u32(c as u32 - 1).unwrap_or(c),
    }
}
