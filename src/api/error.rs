//! HTTP mapping for `BackofficeError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::BackofficeError;

impl BackofficeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::EmptyCart | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BackofficeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Don't expose storage details to clients
        let message = match &self {
            Self::Storage(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(BackofficeError::NotFound("order x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BackofficeError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        let transition = BackofficeError::InvalidTransition { status: OrderStatus::Cancelled, action: "cancel" };
        assert_eq!(transition.status_code(), StatusCode::CONFLICT);
        assert_eq!(transition.to_string(), "cannot cancel an order that is Cancelled");
        assert_eq!(BackofficeError::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_details_hidden() {
        let response = BackofficeError::Storage("password authentication failed".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
