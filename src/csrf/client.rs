//! Client side of the token handshake.
//!
//! A page carries the current token in `<meta name="csrf-token">`, and the HTTP client that talks
//! back to the server sends it in the default header named by [CsrfConfig::header_name]. These
//! helpers keep both in step whenever the server hands out a new token. Nothing in here fails: a
//! missing tag or a missing client is a no-op.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use once_cell::sync::Lazy;
use regex::Regex;

use super::CsrfConfig;

/// Name attribute of the meta tag holding the token.
pub const META_NAME: &str = "csrf-token";

static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<meta\b([^>]*)>").expect("meta tag pattern is valid"));

/// `key="value"`, `key='value'` or `key=value`.
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`/]+))"#)
        .expect("attribute pattern is valid")
});

/// `name` and `content` of one meta tag, in whatever order and quoting they were written.
fn meta_attributes(attributes: &str) -> Option<(String, Option<String>)> {
    let mut name = None;
    let mut content = None;

    for captures in ATTRIBUTE.captures_iter(attributes) {
        let value = (2..=4)
            .find_map(|group| captures.get(group))
            .map(|value| value.as_str().to_string());

        match captures[1].to_ascii_lowercase().as_str() {
            "name" => name = value,
            "content" => content = value,
            _ => {}
        }
    }

    Some((name?, content))
}

/// Lookup and update of `<meta name=...>` tags in a document head.
pub trait MetaDocument {
    /// Content of the named tag, if the tag exists and has a content attribute.
    fn meta_content(&self, name: &str) -> Option<&str>;

    /// Replaces the content of the named tag. Returns `false` without touching anything when the
    /// tag does not exist.
    fn set_meta_content(&mut self, name: &str, content: &str) -> bool;
}

/// The meta tags of a document, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    meta: BTreeMap<String, Option<String>>,
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the meta tags of a rendered page.
    pub fn from_html(html: &str) -> Self {
        let meta = META_TAG
            .captures_iter(html)
            .filter_map(|captures| meta_attributes(&captures[1]))
            .collect();

        Self { meta }
    }

    /// Adds a tag, replacing any tag of the same name.
    pub fn with_meta(mut self, name: &str, content: Option<&str>) -> Self {
        self.meta
            .insert(name.to_string(), content.map(str::to_string));
        self
    }
}

impl MetaDocument for Head {
    fn meta_content(&self, name: &str) -> Option<&str> {
        self.meta.get(name)?.as_deref()
    }

    fn set_meta_content(&mut self, name: &str, content: &str) -> bool {
        match self.meta.get_mut(name) {
            Some(slot) => {
                *slot = Some(content.to_string());
                true
            }
            None => false,
        }
    }
}

/// An HTTP client whose default headers go out with every request.
pub trait DefaultHeaders {
    fn default_headers(&mut self) -> &mut HeaderMap;
}

impl DefaultHeaders for HeaderMap {
    fn default_headers(&mut self) -> &mut HeaderMap {
        self
    }
}

/// Stores `token` in the document's meta tag and, when a client is given, in its default header
/// named by `config`.
pub fn update_csrf_token(
    document: &mut impl MetaDocument,
    client: Option<&mut dyn DefaultHeaders>,
    config: &CsrfConfig,
    token: &str,
) {
    if !document.set_meta_content(META_NAME, token) {
        tracing::debug!("no `{META_NAME}` meta tag, leaving document untouched");
    }

    let Some(client) = client else {
        return;
    };

    let header = config.header_name.as_str();
    let name = match HeaderName::from_bytes(header.as_bytes()) {
        Ok(name) => name,
        Err(error) => {
            tracing::warn!(%error, header, "configured csrf header is not a valid header name");
            return;
        }
    };

    match HeaderValue::from_str(token) {
        Ok(value) => {
            client.default_headers().insert(name, value);
        }
        Err(error) => {
            tracing::warn!(%error, header, "token is not a valid header value");
        }
    }
}

/// The token in the document's meta tag, or an empty string when there is none.
pub fn get_csrf_token(document: &impl MetaDocument) -> String {
    document
        .meta_content(META_NAME)
        .unwrap_or_default()
        .to_string()
}

/// Adopts the token a server response delivered, if it delivered one.
pub fn sync_csrf_token_from_props(
    document: &mut impl MetaDocument,
    client: Option<&mut dyn DefaultHeaders>,
    config: &CsrfConfig,
    token: Option<&str>,
) {
    match token {
        Some(token) if !token.is_empty() => update_csrf_token(document, client, config, token),
        _ => {}
    }
}

/// Pulls the token out of response props, where it sits under the session key.
pub fn token_from_props<'a>(props: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    props.get(key)?.as_str()
}
