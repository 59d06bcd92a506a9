// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use super::require_text;
use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    state::AppState,
    storage::{Attendance, AttendanceRepository},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// Internal id of the attending user
    pub user_id: u64,
    pub event_name: String,
    /// Coins credited for attending
    pub coins: u64,
}

/// Record attendance and credit coins. One check-in per user, event and UTC day.
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInRequest,
    tag = "Attendance",
    responses(
        (status = 201, body = Attendance),
        (status = 403),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Already checked in today")
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<Attendance>), ApiError> {
    require_text("event_name", &request.event_name)?;
    let record = AttendanceRepository::new(&state.db).check_in(
        request.user_id,
        request.event_name.trim(),
        request.coins,
    )?;
    tracing::debug!(admin_id = admin.id(), attendance_id = record.id, "Check-in by admin");
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/me",
    tag = "Attendance",
    responses((status = 200, body = [Attendance]))
)]
pub async fn my_attendance(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    Ok(Json(AttendanceRepository::new(&state.db).history(caller.id())?))
}
