use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;

use super::extract::{Path, Payload};
use super::{App, Result};
use crate::model::{Ad, AdId, NewAd, UpdateAd, View};
use crate::store::Store;

#[instrument(skip(app))]
pub async fn list<S: Store>(State(app): State<App<S>>) -> Result<Json<Vec<Ad>>> {
    Ok(Json(app.ads.list().await?))
}

#[instrument(skip(app))]
pub async fn create<S: Store>(
    State(app): State<App<S>>,
    Payload(payload): Payload<NewAd>,
) -> Result<(StatusCode, Json<Ad>)> {
    let ad = app.ads.create(payload).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

#[instrument(skip(app))]
pub async fn find<S: Store>(State(app): State<App<S>>, Path(id): Path<AdId>) -> Result<Json<Ad>> {
    Ok(Json(app.ads.find(id).await?))
}

#[instrument(skip(app))]
pub async fn update<S: Store>(
    State(app): State<App<S>>,
    Path(id): Path<AdId>,
    Payload(changes): Payload<UpdateAd>,
) -> Result<Json<Ad>> {
    Ok(Json(app.ads.update(id, changes).await?))
}

/// Moves the ad to the trash and answers with its trashed state.
#[instrument(skip(app))]
pub async fn delete<S: Store>(
    State(app): State<App<S>>,
    Path(id): Path<AdId>,
) -> Result<Json<Ad>> {
    Ok(Json(app.ads.delete(id).await?))
}

#[instrument(skip(app))]
pub async fn restore<S: Store>(
    State(app): State<App<S>>,
    Path(id): Path<AdId>,
) -> Result<Json<Ad>> {
    Ok(Json(app.ads.restore(id).await?))
}

#[instrument(skip(app))]
pub async fn force_delete<S: Store>(
    State(app): State<App<S>>,
    Path(id): Path<AdId>,
) -> Result<StatusCode> {
    app.ads.force_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(app))]
pub async fn views<S: Store>(
    State(app): State<App<S>>,
    Path(id): Path<AdId>,
) -> Result<Json<Vec<View>>> {
    Ok(Json(app.ads.views(id).await?))
}

#[instrument(skip(app))]
pub async fn record_view<S: Store>(
    State(app): State<App<S>>,
    Path(id): Path<AdId>,
) -> Result<(StatusCode, Json<View>)> {
    let view = app.ads.record_view(id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}
