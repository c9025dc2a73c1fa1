use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Closed error taxonomy for the whole service. Every failure a handler can
/// surface is one of these; collaborator errors (sqlx, token codec, mailer)
/// are remapped before they reach a response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {cause}: {message}")]
    Validation { cause: String, message: String },

    #[error("authentication error: {cause}: {message}")]
    Authentication { cause: String, message: String },

    #[error("access forbidden: {cause}: {message}")]
    AccessForbidden { cause: String, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(cause: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            cause: cause.into(),
            message: message.into(),
        }
    }

    pub fn authentication(cause: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Authentication {
            cause: cause.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(cause: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::AccessForbidden {
            cause: cause.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            AppError::AccessForbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (cause, message) = match &self {
            AppError::Validation { cause, message }
            | AppError::Authentication { cause, message }
            | AppError::AccessForbidden { cause, message } => (cause.clone(), message.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    "internal server error".to_string(),
                    "Something went wrong. Please try again later".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    "internal server error".to_string(),
                    "Something went wrong. Please try again later".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "cause": cause,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::validation("email", "taken").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::authentication("token", "missing").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("email", "unverified").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = AppError::Internal(anyhow::anyhow!("smtp host unreachable")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
