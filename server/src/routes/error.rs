use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ubsmap_shared::{DataLoadError, ExportError, RenderError};

/// Handler failure, rendered as `{"error": kind, "message": text}`.
#[derive(Debug)]
pub enum ApiError {
    Render(RenderError),
    UnknownArtifact(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Render(RenderError::UnknownTile(_)) => StatusCode::BAD_REQUEST,
            ApiError::Render(RenderError::EmptyGeometry(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Render(RenderError::DataLoad(_) | RenderError::Export(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::UnknownArtifact(_) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Render(e) => e.kind(),
            ApiError::UnknownArtifact(_) => "not_found",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Render(e) => e.to_string(),
            ApiError::UnknownArtifact(file) => format!("no export named {file:?}"),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Render(e)
    }
}

impl From<DataLoadError> for ApiError {
    fn from(e: DataLoadError) -> Self {
        ApiError::Render(e.into())
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Render(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}
