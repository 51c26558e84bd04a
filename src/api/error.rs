use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snafu::{IntoError as _, Location, Snafu};

use crate::database::DatabaseError;
use crate::model::AdId;
use crate::store::StoreError;

#[derive(Debug, Snafu, Serialize)]
#[snafu(visibility(pub(crate)))]
#[serde(tag = "error", content = "data")]
pub enum ApiError {
    #[snafu(display("ad `{id}` does not exist"))]
    AdNotFound {
        id: AdId,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid request path: {reason}"))]
    InvalidPath {
        reason: String,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid request body: {reason}"))]
    InvalidBody {
        reason: String,
        #[serde(skip)]
        status: StatusCode,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("the storage backend failed"))]
    Storage {
        #[serde(skip)]
        source: DatabaseError,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to render the `{template}` page"))]
    Render {
        template: String,
        #[serde(skip)]
        source: tera::Error,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => AdNotFoundSnafu { id }.build(),
            StoreError::Database { source } => StorageSnafu.into_error(source),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        InvalidPathSnafu {
            reason: rejection.body_text(),
        }
        .build()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        InvalidBodySnafu {
            reason: rejection.body_text(),
            status: rejection.status(),
        }
        .build()
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AdNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::Storage { .. } | ApiError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse {
    message: String,
    #[serde(flatten)]
    data: ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let content = ApiResponse {
            message: self.to_string(),
            data: self,
        };

        (status, Json(content)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ads_map_to_404() {
        let id = AdId::uuid();
        let error: ApiError = crate::store::NotFoundSnafu { id }.build().into();

        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(ApiResponse {
                message: error.to_string(),
                data: error,
            })
            .unwrap(),
            serde_json::json!({
                "message": format!("ad `{id}` does not exist"),
                "error": "AdNotFound",
                "data": { "id": id.to_string() },
            })
        );
    }
}
