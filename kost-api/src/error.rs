use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kost_domain::DomainError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(msg) => AppError::NotFoundError(msg),
            DomainError::Forbidden(msg) => AppError::AuthorizationError(msg),
            DomainError::InsufficientPoints { .. } => AppError::ValidationError(err.to_string()),
            DomainError::Validation(msg) => AppError::ValidationError(msg),
            DomainError::Storage(err) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (
                AppError::from(DomainError::NotFound("x".into())).into_response(),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(DomainError::Forbidden("x".into())).into_response(),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::from(DomainError::InsufficientPoints {
                    requested: 10,
                    available: 5,
                })
                .into_response(),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(DomainError::Validation("x".into())).into_response(),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (response, expected) in cases {
            assert_eq!(response.status(), expected);
        }
    }
}
