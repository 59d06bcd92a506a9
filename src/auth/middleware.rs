// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth gate middleware.
//!
//! Wraps every `/api` route:
//!
//! ```text
//! request ─┬─ public route ──────────────────────────────► handler
//!          └─ Authorization: tma <initData>
//!               └─ verify signature + freshness
//!                    └─ look up user by Telegram id
//!                         ├─ found ─► extensions += AuthenticatedUser ─► handler
//!                         └─ absent ─► 401 user_not_registered
//! ```
//!
//! The gate only reads the user directory. Registration happens in
//! `POST /api/auth/telegram`, which is public.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::init_data::InitDataVerifier;
use super::policy::PublicRoutePolicy;
use super::{AuthError, AuthenticatedUser};
use crate::storage::{Database, UserRepository};

/// Authorization scheme used by Telegram Mini Apps.
const TMA_SCHEME: &str = "tma ";

/// Gate state: verifier, user directory and route policy.
#[derive(Clone)]
pub struct AuthGate {
    verifier: InitDataVerifier,
    db: Arc<Database>,
    policy: Arc<PublicRoutePolicy>,
}

impl AuthGate {
    pub fn new(verifier: InitDataVerifier, db: Arc<Database>, policy: PublicRoutePolicy) -> Self {
        Self {
            verifier,
            db,
            policy: Arc::new(policy),
        }
    }

    pub fn verifier(&self) -> &InitDataVerifier {
        &self.verifier
    }

    pub fn policy(&self) -> &PublicRoutePolicy {
        &self.policy
    }

    /// Resolve the caller from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let raw = header
            .strip_prefix(TMA_SCHEME)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let init_data = self.verifier.verify(raw)?;

        let user = UserRepository::new(&self.db)
            .find_by_telegram_id(init_data.user.id)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .ok_or(AuthError::UserNotRegistered)?;

        Ok(AuthenticatedUser::new(user, init_data))
    }
}

/// Authentication middleware function.
///
/// Public routes pass straight through. If such a request nevertheless carries
/// valid credentials the caller is attached, so handlers can personalize the
/// response; invalid credentials on a public route are ignored.
pub async fn auth_gate(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if gate.policy.is_public(&method, &path) {
        if request.headers().contains_key(AUTHORIZATION) {
            if let Ok(user) = gate.authenticate(request.headers()) {
                request.extensions_mut().insert(user);
            }
        }
        return next.run(request).await;
    }

    match gate.authenticate(request.headers()) {
        Ok(user) => {
            tracing::debug!(
                user_id = user.id(),
                role = %user.role(),
                %path,
                "Request authenticated"
            );
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(
                %method,
                %path,
                error_code = e.error_code(),
                "Request rejected by auth gate"
            );
            e.into_response()
        }
    }
}
