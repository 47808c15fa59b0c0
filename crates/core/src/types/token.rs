//! Bearer token types for backend authentication.
//!
//! Tokens are opaque strings minted by the backend. Both wrappers redact
//! their contents from `Debug` output so tokens never leak into logs or
//! error reports.

use serde::{Deserialize, Serialize};

/// Short-lived access token sent as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Expose the raw token for header construction.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Long-lived refresh token exchanged for new access tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wrap a raw token string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Expose the raw token for the refresh exchange.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken([REDACTED])")
    }
}

impl From<String> for RefreshToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let access = AccessToken::new("eyJhbGciOi.super.secret".to_string());
        let debug = format!("{access:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));

        let refresh = RefreshToken::new("refresh.secret.value".to_string());
        let debug = format!("{refresh:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_serde_transparent() {
        let access = AccessToken::new("abc123".to_string());
        assert_eq!(serde_json::to_string(&access).unwrap(), "\"abc123\"");

        let back: AccessToken = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back.reveal(), "abc123");
    }
}
