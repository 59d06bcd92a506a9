// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and privilege escalation endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::require_text;
use crate::{
    auth::Auth,
    error::ApiError,
    services::{authenticate_with_init_data, promote_with_admin_credentials, verify_student},
    state::AppState,
    storage::User,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramAuthRequest {
    /// Raw `initData` query string from the Mini App
    pub init_data: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
}

#[utoipa::path(
    post,
    path = "/api/auth/telegram",
    request_body = TelegramAuthRequest,
    tag = "Auth",
    responses(
        (status = 200, body = UserResponse),
        (status = 401, description = "initData rejected")
    )
)]
pub async fn telegram_login(
    State(state): State<AppState>,
    Json(request): Json<TelegramAuthRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_text("init_data", &request.init_data)?;
    let user = authenticate_with_init_data(state.gate.verifier(), &state.db, &request.init_data)?;
    Ok(Json(UserResponse { user }))
}

/// Link the caller to a school account and promote them to student.
#[utoipa::path(
    post,
    path = "/api/auth/school",
    request_body = CredentialsRequest,
    tag = "Auth",
    responses(
        (status = 200, body = UserResponse),
        (status = 400, description = "School rejected the credentials"),
        (status = 502, description = "School platform unavailable")
    )
)]
pub async fn school_login(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_text("username", &request.username)?;
    require_text("password", &request.password)?;

    let user = verify_student(
        state.school.as_ref(),
        &state.db,
        caller.id(),
        request.username.trim(),
        &request.password,
    )
    .await?;
    Ok(Json(UserResponse { user }))
}

/// Promote the caller to admin with the bootstrap credentials.
#[utoipa::path(
    post,
    path = "/api/auth/admin",
    request_body = CredentialsRequest,
    tag = "Auth",
    responses(
        (status = 200, body = UserResponse),
        (status = 403, description = "Invalid admin credentials"),
        (status = 404, description = "Bootstrap credentials not configured")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = promote_with_admin_credentials(
        &state.db,
        state.config.admin.as_ref(),
        caller.id(),
        &request.username,
        &request.password,
    )?;
    Ok(Json(UserResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::tests::caller;
    use crate::auth::init_data::test_support::signed_for;
    use crate::auth::Role;
    use crate::config::AdminCredentials;
    use crate::storage::UserRepository;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn telegram_login_registers_guest() {
        let (state, _dir) = AppState::for_tests();
        let Json(body) = telegram_login(
            State(state),
            Json(TelegramAuthRequest {
                init_data: signed_for(42, "Ada"),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.user.telegram_id, 42);
        assert_eq!(body.user.role, Role::Guest);
    }

    #[tokio::test]
    async fn telegram_login_rejects_blank_payload() {
        let (state, _dir) = AppState::for_tests();
        let err = telegram_login(
            State(state),
            Json(TelegramAuthRequest {
                init_data: "  ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    fn with_admin(mut state: AppState) -> AppState {
        std::sync::Arc::make_mut(&mut state.config).admin = Some(AdminCredentials {
            username: "root".into(),
            password: "s3cret".into(),
        });
        state
    }

    async fn guest(state: &AppState, telegram_id: i64) -> u64 {
        let Json(login) = telegram_login(
            State(state.clone()),
            Json(TelegramAuthRequest {
                init_data: signed_for(telegram_id, "Root"),
            }),
        )
        .await
        .unwrap();
        login.user.id
    }

    fn credentials(username: &str, password: &str) -> Json<CredentialsRequest> {
        Json(CredentialsRequest {
            username: username.into(),
            password: password.into(),
        })
    }

    #[tokio::test]
    async fn admin_login_with_configured_credentials() {
        let (state, _dir) = AppState::for_tests();
        let state = with_admin(state);
        let user_id = guest(&state, 7).await;

        let err = admin_login(
            State(state.clone()),
            Auth(caller(user_id, Role::Guest)),
            credentials("root", "wrong"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let Json(body) = admin_login(
            State(state),
            Auth(caller(user_id, Role::Guest)),
            credentials("root", "s3cret"),
        )
        .await
        .unwrap();
        assert_eq!(body.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn admin_login_disabled_without_configured_password() {
        let (state, _dir) = AppState::for_tests();
        let user_id = guest(&state, 7).await;

        let err = admin_login(
            State(state.clone()),
            Auth(caller(user_id, Role::Guest)),
            credentials("admin", "admin"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(UserRepository::new(&state.db).get(user_id).unwrap().role, Role::Guest);
    }

    #[tokio::test]
    async fn school_login_unreachable_platform_is_bad_gateway() {
        let (state, _dir) = AppState::for_tests();
        let Json(login) = telegram_login(
            State(state.clone()),
            Json(TelegramAuthRequest {
                init_data: signed_for(8, "Bea"),
            }),
        )
        .await
        .unwrap();

        let err = school_login(
            State(state),
            Auth(caller(login.user.id, Role::Guest)),
            Json(CredentialsRequest {
                username: "bea".into(),
                password: "pw".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }
}
