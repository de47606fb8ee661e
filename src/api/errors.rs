use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::errors::KycError;

pub type ApiResult<T> = Result<T, KycError>;

impl IntoResponse for KycError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            KycError::Config(_) | KycError::Validation(_) => StatusCode::BAD_REQUEST,
            KycError::NotFound(_) => StatusCode::NOT_FOUND,
            KycError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (KycError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (KycError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (KycError::Conflict("x".into()), StatusCode::CONFLICT),
            (KycError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
