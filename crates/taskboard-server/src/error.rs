//! HTTP error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use taskboard_core::BoardError;

/// Errors a handler can return
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Board(#[from] BoardError),

    /// A path segment that is not a valid id
    #[error("Malformed id: {0}")]
    MalformedId(String),

    /// The body is not JSON, or does not fit the request shape
    #[error("Invalid request body: {}", .0.body_text())]
    BadBody(#[from] JsonRejection),

    /// A store call panicked or was cancelled on the blocking pool
    #[error("Worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Board(BoardError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Board(BoardError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Board(BoardError::Conflict { .. }) => StatusCode::CONFLICT,
            ApiError::Board(BoardError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MalformedId(_) | ApiError::BadBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::PersistenceError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BoardError::NotFound("container 1".into()), StatusCode::NOT_FOUND),
            (BoardError::InvalidArgument("title".into()), StatusCode::BAD_REQUEST),
            (
                BoardError::Conflict {
                    container: "1".into(),
                    expected: 1,
                    actual: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                PersistenceError::Database("disk I/O error".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
        assert_eq!(
            ApiError::MalformedId("abc".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
