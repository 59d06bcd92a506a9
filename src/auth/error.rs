// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::init_data::VerificationError;

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header present but not `tma <initData>`
    InvalidAuthHeader,
    /// `initData` carries no hash
    MissingSignature,
    /// `initData` hash does not match
    InvalidSignature,
    /// `auth_date` is older than the allowed window
    InitDataExpired,
    /// `initData` is structurally invalid
    MalformedInitData(String),
    /// Signature is valid but the Telegram user never called `/api/auth/telegram`
    UserNotRegistered,
    /// Internal error
    InternalError(String),
    /// Insufficient permissions
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MissingSignature => "missing_signature",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InitDataExpired => "init_data_expired",
            AuthError::MalformedInitData(_) => "malformed_init_data",
            AuthError::UserNotRegistered => "user_not_registered",
            AuthError::InternalError(_) => "internal_error",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MissingSignature
            | AuthError::InvalidSignature
            | AuthError::InitDataExpired
            | AuthError::MalformedInitData(_)
            | AuthError::UserNotRegistered => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VerificationError> for AuthError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::MissingSignature => AuthError::MissingSignature,
            VerificationError::BadSignature => AuthError::InvalidSignature,
            VerificationError::Expired => AuthError::InitDataExpired,
            VerificationError::Malformed(reason) => AuthError::MalformedInitData(reason),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "missing authorization header"),
            AuthError::InvalidAuthHeader => {
                write!(f, "invalid authorization format, expected: tma <initData>")
            }
            AuthError::MissingSignature => write!(f, "init data is not signed"),
            AuthError::InvalidSignature => write!(f, "init data signature is invalid"),
            AuthError::InitDataExpired => write!(f, "init data has expired"),
            AuthError::MalformedInitData(reason) => write!(f, "malformed init data: {reason}"),
            AuthError::UserNotRegistered => {
                write!(f, "user not found, please authenticate first")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AuthError::InternalError(msg) = &self {
            tracing::error!(error = %msg, "Authentication failed internally");
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
