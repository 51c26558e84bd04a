use std::sync::Arc;

use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use derive_new::new;
use tera::Tera;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::csrf::{self, CsrfConfig};
use crate::store::{AdRepository, Store};

mod ads;
mod error;
mod extract;
mod pages;

pub use error::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Shared state of every handler.
#[derive(Debug, Clone, new)]
pub struct App<S: Store> {
    pub ads: AdRepository<S>,
    pub csrf: Arc<CsrfConfig>,
    pub templates: Arc<Tera>,
}

impl<S: Store> App<S> {
    /// State around `store` with the bundled page templates.
    pub fn create(store: S, csrf: CsrfConfig) -> Result<Self, tera::Error> {
        let mut templates = Tera::default();
        templates.add_raw_template("index.html", INDEX_TEMPLATE)?;

        Ok(Self::new(
            AdRepository::new(store),
            Arc::new(csrf),
            Arc::new(templates),
        ))
    }
}

pub fn router<S: Store>(app: App<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE]);

    Router::new()
        .route("/", get(pages::index::<S>))
        .route("/csrf-token", get(pages::csrf_token::<S>))
        .route("/ads", get(ads::list::<S>).post(ads::create::<S>))
        .route(
            "/ads/:id",
            get(ads::find::<S>)
                .patch(ads::update::<S>)
                .delete(ads::delete::<S>),
        )
        .route("/ads/:id/restore", post(ads::restore::<S>))
        .route("/ads/:id/force", delete(ads::force_delete::<S>))
        .route(
            "/ads/:id/views",
            get(ads::views::<S>).post(ads::record_view::<S>),
        )
        .layer(from_fn_with_state(app.csrf.clone(), csrf::verify))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app)
}
