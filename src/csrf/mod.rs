//! Anti-forgery tokens.
//!
//! The server hands out an opaque token in a cookie and in the response props; clients echo it
//! back in a header on every state-changing request, and [verify] rejects requests where header
//! and cookie disagree.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use snafu::{Location, Snafu};

pub mod client;

pub const DEFAULT_HEADER: &str = "X-CSRF-TOKEN";
pub const DEFAULT_COOKIE: &str = "XSRF-TOKEN";
pub const DEFAULT_SESSION_KEY: &str = "csrf_token";

/// Where the token travels. Loaded from `CSRF_HEADER`, `CSRF_COOKIE` and `CSRF_SESSION_KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CsrfConfig {
    /// Request header the server reads the echoed token from.
    #[serde(rename = "csrf_header", default = "default_header")]
    pub header_name: String,
    /// Cookie carrying the token to the client.
    #[serde(rename = "csrf_cookie", default = "default_cookie")]
    pub cookie_name: String,
    /// Key under which the token is embedded in response props.
    #[serde(rename = "csrf_session_key", default = "default_session_key")]
    pub session_key: String,
}

fn default_header() -> String {
    DEFAULT_HEADER.to_string()
}

fn default_cookie() -> String {
    DEFAULT_COOKIE.to_string()
}

fn default_session_key() -> String {
    DEFAULT_SESSION_KEY.to_string()
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: default_header(),
            cookie_name: default_cookie(),
            session_key: default_session_key(),
        }
    }
}

impl CsrfConfig {
    /// Creates a fresh token and the cookie that carries it.
    pub fn issue(&self) -> (String, Cookie<'static>) {
        let token = uuid::Uuid::new_v4().simple().to_string();

        let cookie = Cookie::build((self.cookie_name.clone(), token.clone()))
            .path("/")
            .same_site(SameSite::Lax)
            .build();

        (token, cookie)
    }

    /// Response props carrying `token` under the session key.
    pub fn props(&self, token: &str) -> serde_json::Value {
        let mut props = serde_json::Map::new();
        props.insert(self.session_key.clone(), token.into());
        props.into()
    }
}

/// HTTP 419, the conventional "page expired" answer to a stale or missing token.
pub fn token_mismatch_status() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::FORBIDDEN)
}

#[derive(Debug, Snafu, Serialize)]
#[serde(tag = "error", content = "data")]
pub enum CsrfError {
    #[snafu(display("request carries no csrf token in `{header}`"))]
    MissingHeader {
        header: String,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("no csrf token has been issued to this client"))]
    MissingCookie {
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("csrf token mismatch"))]
    Mismatch {
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Serialize)]
struct CsrfResponse {
    message: String,
    #[serde(flatten)]
    data: CsrfError,
}

impl IntoResponse for CsrfError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "rejected request");

        let content = CsrfResponse {
            message: self.to_string(),
            data: self,
        };

        (token_mismatch_status(), Json(content)).into_response()
    }
}

/// Middleware rejecting state-changing requests whose token header does not match the token
/// cookie. Safe methods pass through untouched.
pub async fn verify(
    State(config): State<Arc<CsrfConfig>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, CsrfError> {
    if request.method().is_safe() {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(config.header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    let Some(header) = header else {
        return MissingHeaderSnafu {
            header: config.header_name.as_str(),
        }
        .fail();
    };

    let Some(cookie) = jar.get(&config.cookie_name) else {
        return MissingCookieSnafu.fail();
    };

    if cookie.value() != header {
        return MismatchSnafu.fail();
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_conventional_names() {
        let config = CsrfConfig::default();
        assert_eq!(config.header_name, "X-CSRF-TOKEN");
        assert_eq!(config.cookie_name, "XSRF-TOKEN");
        assert_eq!(config.session_key, "csrf_token");
    }

    #[test]
    fn issued_tokens_are_fresh_and_land_in_the_cookie() {
        let config = CsrfConfig::default();
        let (first, cookie) = config.issue();
        let (second, _) = config.issue();

        assert_ne!(first, second);
        assert!(!first.is_empty());
        assert_eq!(cookie.name(), "XSRF-TOKEN");
        assert_eq!(cookie.value(), first);
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn props_use_the_session_key() {
        let config = CsrfConfig {
            session_key: "_token".into(),
            ..Default::default()
        };

        assert_eq!(config.props("abc"), serde_json::json!({ "_token": "abc" }));
    }

    #[test]
    fn mismatch_answers_419() {
        let response = MismatchSnafu.build().into_response();
        assert_eq!(response.status().as_u16(), 419);
    }
}
