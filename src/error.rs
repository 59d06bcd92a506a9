// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP error responses.
//!
//! Domain errors are classified here, once. Anything that maps to a 500 is
//! logged with its detail and returned to the client as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::providers::{AiError, SchoolError};
use crate::services::{IdentityError, VerifyStudentError};
use crate::storage::{CheckInError, LedgerError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Machine-readable code, set for authentication failures
    pub code: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Log `detail` and return a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        if let AuthError::InternalError(detail) = &e {
            return Self::internal(detail);
        }
        Self {
            status: e.status_code(),
            message: e.to_string(),
            code: Some(e.error_code()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::not_found(format!("{what} not found")),
            StoreError::Conflict(conflict) => Self::conflict(conflict.to_string()),
            other => Self::internal(other),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ItemNotFound(_) | LedgerError::UserNotFound(_) => {
                Self::not_found(e.to_string())
            }
            LedgerError::OutOfStock | LedgerError::InsufficientFunds { .. } => {
                Self::conflict(e.to_string())
            }
            LedgerError::Storage(inner) => inner.into(),
        }
    }
}

impl From<CheckInError> for ApiError {
    fn from(e: CheckInError) -> Self {
        match e {
            CheckInError::DuplicateCheckIn => Self::conflict(e.to_string()),
            CheckInError::UserNotFound(_) => Self::not_found(e.to_string()),
            CheckInError::Storage(inner) => inner.into(),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Verification(v) => AuthError::from(v).into(),
            IdentityError::InvalidAdminCredentials => Self::forbidden(e.to_string()),
            IdentityError::AdminBootstrapDisabled => Self::not_found(e.to_string()),
            IdentityError::Storage(inner) => inner.into(),
        }
    }
}

impl From<VerifyStudentError> for ApiError {
    fn from(e: VerifyStudentError) -> Self {
        match e {
            VerifyStudentError::School(SchoolError::AuthenticationFailed) => {
                Self::bad_request("invalid school credentials")
            }
            VerifyStudentError::School(school) => {
                tracing::warn!(error = %school, "School verification failed");
                Self::bad_gateway("school verification is unavailable")
            }
            VerifyStudentError::Storage(inner) => inner.into(),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::NotConfigured => Self::service_unavailable(e.to_string()),
            other => {
                tracing::warn!(error = %other, "Summary request failed");
                Self::bad_gateway("summary service is unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Conflict;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let conflict = ApiError::conflict("dup");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert!(conflict.code.is_none());
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[tokio::test]
    async fn auth_errors_keep_their_code() {
        let response = ApiError::from(AuthError::InitDataExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "init_data_expired");
    }

    #[test]
    fn ledger_errors_classify() {
        assert_eq!(ApiError::from(LedgerError::OutOfStock).status, StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(LedgerError::InsufficientFunds { balance: 1, price: 2 }).status,
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::from(LedgerError::ItemNotFound(1)).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_detail_is_not_leaked() {
        let serde_err = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ApiError::from(StoreError::Serde(serde_err));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");

        let dup = ApiError::from(StoreError::Conflict(Conflict::DuplicateApplication));
        assert_eq!(dup.status, StatusCode::CONFLICT);
    }
}
