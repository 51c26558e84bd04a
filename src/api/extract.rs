//! Extractors whose rejections answer in the same JSON shape as every other [ApiError].

use axum::extract::{FromRequest, FromRequestParts};

use super::ApiError;

/// [axum::extract::Path] rejecting with [ApiError::InvalidPath].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

/// [axum::Json] rejecting with [ApiError::InvalidBody].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);
