//! Mapping of lifecycle failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use hubauth_service::{AuthError, ErrorCode};

/// A lifecycle failure on its way out as an HTTP response.
pub struct ApiError(AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

fn status_for(code: ErrorCode) -> (StatusCode, &'static str) {
    match code {
        ErrorCode::InvalidArgument => (StatusCode::BAD_REQUEST, "invalid_argument"),
        ErrorCode::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        ErrorCode::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied"),
        ErrorCode::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ErrorCode::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = status_for(self.0.code());
        // Internal detail stays in the logs, not the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_maps_to_a_distinct_status() {
        assert_eq!(status_for(ErrorCode::InvalidArgument).0, StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::Unauthenticated).0, StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorCode::PermissionDenied).0, StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorCode::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorCode::Internal).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
