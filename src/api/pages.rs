use axum::extract::State;
use axum::response::Html;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use snafu::ResultExt as _;

use super::{App, RenderSnafu, Result};
use crate::csrf::client::META_NAME;
use crate::store::Store;

/// The landing page. Keeps the token the browser already holds and issues one otherwise.
pub async fn index<S: Store>(
    State(app): State<App<S>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let existing = jar
        .get(&app.csrf.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    let (token, jar) = match existing {
        Some(token) => (token, jar),
        None => {
            let (token, cookie) = app.csrf.issue();
            (token, jar.add(cookie))
        }
    };

    let mut context = tera::Context::new();
    context.insert("meta_name", META_NAME);
    context.insert("csrf_token", &token);

    let page = app
        .templates
        .render("index.html", &context)
        .context(RenderSnafu {
            template: "index.html",
        })?;

    Ok((jar, Html(page)))
}

/// Rotates the token and hands it out in props, for clients to pass to
/// [sync_csrf_token_from_props](crate::csrf::client::sync_csrf_token_from_props).
pub async fn csrf_token<S: Store>(
    State(app): State<App<S>>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    let (token, cookie) = app.csrf.issue();
    tracing::debug!("issued csrf token");

    (jar.add(cookie), Json(app.csrf.props(&token)))
}
