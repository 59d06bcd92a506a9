// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::require_text;
use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    state::AppState,
    storage::{Club, ClubRepository, ClubView, NewClub},
};

#[utoipa::path(
    get,
    path = "/api/clubs",
    tag = "Clubs",
    responses((status = 200, body = [ClubView]))
)]
pub async fn list_clubs(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<Vec<ClubView>>, ApiError> {
    Ok(Json(ClubRepository::new(&state.db).list(caller.id())?))
}

#[utoipa::path(
    get,
    path = "/api/clubs/{id}",
    params(("id" = u64, Path, description = "Club id")),
    tag = "Clubs",
    responses((status = 200, body = ClubView), (status = 404))
)]
pub async fn get_club(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<u64>,
) -> Result<Json<ClubView>, ApiError> {
    Ok(Json(ClubRepository::new(&state.db).get(id, caller.id())?))
}

#[utoipa::path(
    post,
    path = "/api/clubs",
    request_body = NewClub,
    tag = "Clubs",
    responses((status = 201, body = Club), (status = 400), (status = 403))
)]
pub async fn create_club(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Json(new): Json<NewClub>,
) -> Result<(StatusCode, Json<Club>), ApiError> {
    require_text("name", &new.name)?;
    let club = ClubRepository::new(&state.db).create(new)?;
    Ok((StatusCode::CREATED, Json(club)))
}

#[utoipa::path(
    delete,
    path = "/api/clubs/{id}",
    params(("id" = u64, Path, description = "Club id")),
    tag = "Clubs",
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_club(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    ClubRepository::new(&state.db).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join a club. Joining twice is a no-op.
#[utoipa::path(
    post,
    path = "/api/clubs/{id}/join",
    params(("id" = u64, Path, description = "Club id")),
    tag = "Clubs",
    responses((status = 200, body = ClubView), (status = 404))
)]
pub async fn join_club(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<u64>,
) -> Result<Json<ClubView>, ApiError> {
    let repo = ClubRepository::new(&state.db);
    if repo.join(id, caller.id())? {
        tracing::info!(club_id = id, user_id = caller.id(), "Joined club");
    }
    Ok(Json(repo.get(id, caller.id())?))
}

/// Leave a club. Leaving when not a member is a no-op.
#[utoipa::path(
    post,
    path = "/api/clubs/{id}/leave",
    params(("id" = u64, Path, description = "Club id")),
    tag = "Clubs",
    responses((status = 200, body = ClubView), (status = 404))
)]
pub async fn leave_club(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<u64>,
) -> Result<Json<ClubView>, ApiError> {
    let repo = ClubRepository::new(&state.db);
    repo.leave(id, caller.id())?;
    Ok(Json(repo.get(id, caller.id())?))
}
