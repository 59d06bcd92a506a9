// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{AdminOnly, Auth, Role},
    error::ApiError,
    state::AppState,
    storage::{User, UserRepository},
};

const DEFAULT_LEADERBOARD_LIMIT: usize = 20;
const MAX_LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    /// Number of entries, 1 to 100 (default 20)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub coins: u64,
    pub school_level: u32,
}

impl LeaderboardEntry {
    fn ranked(rank: usize, user: User) -> Self {
        Self {
            rank,
            user_id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            photo_url: user.photo_url,
            coins: user.coins,
            school_level: user.school_level,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, body = User), (status = 401))
)]
pub async fn me(Auth(caller): Auth) -> Json<User> {
    Json(caller.user)
}

/// Raise a user's role. Lowering a role is rejected.
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(("id" = u64, Path, description = "User id")),
    request_body = SetRoleRequest,
    tag = "Users",
    responses(
        (status = 200, body = User),
        (status = 400, description = "Requested role is below the current one"),
        (status = 403),
        (status = 404)
    )
)]
pub async fn set_role(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<u64>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<User>, ApiError> {
    let repo = UserRepository::new(&state.db);
    let current = repo.get(id)?;
    if request.role < current.role {
        return Err(ApiError::bad_request(format!(
            "role can only be escalated, user is already {}",
            current.role
        )));
    }

    let user = repo.escalate_role(id, request.role)?;
    tracing::info!(admin_id = admin.id(), user_id = id, role = %user.role, "Role escalated");
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    params(LeaderboardQuery),
    tag = "Users",
    responses((status = 200, body = [LeaderboardEntry]))
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    _caller: Auth,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let entries = UserRepository::new(&state.db)
        .leaderboard(limit)?
        .into_iter()
        .enumerate()
        .map(|(i, user)| LeaderboardEntry::ranked(i + 1, user))
        .collect();
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::tests::caller;
    use crate::storage::repository::users::tests::seed_user;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn set_role_escalates_but_never_lowers() {
        let (state, _dir) = AppState::for_tests();
        let admin = seed_user(&state.db, 1, Role::Admin, 0);
        let target = seed_user(&state.db, 2, Role::Student, 0);

        let Json(user) = set_role(
            State(state.clone()),
            AdminOnly(caller(admin.id, Role::Admin)),
            Path(target.id),
            Json(SetRoleRequest {
                role: Role::ClubLeader,
            }),
        )
        .await
        .unwrap();
        assert_eq!(user.role, Role::ClubLeader);

        let err = set_role(
            State(state),
            AdminOnly(caller(admin.id, Role::Admin)),
            Path(target.id),
            Json(SetRoleRequest { role: Role::Guest }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn set_role_unknown_user_is_not_found() {
        let (state, _dir) = AppState::for_tests();
        let err = set_role(
            State(state),
            AdminOnly(caller(1, Role::Admin)),
            Path(99),
            Json(SetRoleRequest {
                role: Role::Student,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_coins() {
        let (state, _dir) = AppState::for_tests();
        let poor = seed_user(&state.db, 1, Role::Student, 5);
        let rich = seed_user(&state.db, 2, Role::Student, 50);

        let Json(entries) = leaderboard(
            State(state),
            Auth(caller(poor.id, Role::Student)),
            Query(LeaderboardQuery { limit: Some(0) }),
        )
        .await
        .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].user_id, rich.id);
    }
}
