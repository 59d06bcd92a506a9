// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::require_text;
use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    state::AppState,
    storage::{
        ApplicationWithUser, Hackathon, HackathonApplication, HackathonRepository,
        HackathonStatus, NewHackathon,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct HackathonQuery {
    pub status: Option<HackathonStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApplyRequest {
    #[serde(default)]
    pub team_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/hackathons",
    params(HackathonQuery),
    tag = "Hackathons",
    responses((status = 200, body = [Hackathon]))
)]
pub async fn list_hackathons(
    State(state): State<AppState>,
    Query(query): Query<HackathonQuery>,
) -> Result<Json<Vec<Hackathon>>, ApiError> {
    Ok(Json(HackathonRepository::new(&state.db).list(query.status)?))
}

#[utoipa::path(
    get,
    path = "/api/hackathons/{id}",
    params(("id" = u64, Path, description = "Hackathon id")),
    tag = "Hackathons",
    responses((status = 200, body = Hackathon), (status = 404))
)]
pub async fn get_hackathon(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Hackathon>, ApiError> {
    Ok(Json(HackathonRepository::new(&state.db).get(id)?))
}

#[utoipa::path(
    post,
    path = "/api/hackathons",
    request_body = NewHackathon,
    tag = "Hackathons",
    responses((status = 201, body = Hackathon), (status = 400), (status = 403))
)]
pub async fn create_hackathon(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Json(new): Json<NewHackathon>,
) -> Result<(StatusCode, Json<Hackathon>), ApiError> {
    require_text("title", &new.title)?;
    if let (Some(start), Some(end)) = (new.start_date, new.end_date) {
        if end < start {
            return Err(ApiError::bad_request("end_date is before start_date"));
        }
    }
    let hackathon = HackathonRepository::new(&state.db).create(new)?;
    Ok((StatusCode::CREATED, Json(hackathon)))
}

/// Delete a hackathon together with its applications.
#[utoipa::path(
    delete,
    path = "/api/hackathons/{id}",
    params(("id" = u64, Path, description = "Hackathon id")),
    tag = "Hackathons",
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_hackathon(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    HackathonRepository::new(&state.db).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/hackathons/{id}/apply",
    params(("id" = u64, Path, description = "Hackathon id")),
    request_body = ApplyRequest,
    tag = "Hackathons",
    responses(
        (status = 201, body = HackathonApplication),
        (status = 404),
        (status = 409, description = "Already applied")
    )
)]
pub async fn apply(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<u64>,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<HackathonApplication>), ApiError> {
    let application = HackathonRepository::new(&state.db).apply(
        id,
        caller.id(),
        request.team_name.map(|t| t.trim().to_string()),
    )?;
    tracing::info!(hackathon_id = id, user_id = caller.id(), "Hackathon application");
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/hackathons/{id}/applications",
    params(("id" = u64, Path, description = "Hackathon id")),
    tag = "Hackathons",
    responses((status = 200, body = [ApplicationWithUser]), (status = 403), (status = 404))
)]
pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
) -> Result<Json<Vec<ApplicationWithUser>>, ApiError> {
    let repo = HackathonRepository::new(&state.db);
    repo.get(id)?;
    Ok(Json(repo.applications(id)?))
}
