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
    storage::{GovMember, GovRepository, NewGovMember},
};

#[utoipa::path(
    get,
    path = "/api/gov",
    tag = "Student government",
    responses((status = 200, body = [GovMember]))
)]
pub async fn list_gov(
    State(state): State<AppState>,
    _caller: Auth,
) -> Result<Json<Vec<GovMember>>, ApiError> {
    Ok(Json(GovRepository::new(&state.db).list()?))
}

#[utoipa::path(
    post,
    path = "/api/gov",
    request_body = NewGovMember,
    tag = "Student government",
    responses((status = 201, body = GovMember), (status = 400), (status = 403))
)]
pub async fn create_gov_member(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Json(new): Json<NewGovMember>,
) -> Result<(StatusCode, Json<GovMember>), ApiError> {
    require_text("name", &new.name)?;
    require_text("role_title", &new.role_title)?;
    let member = GovRepository::new(&state.db).create(new)?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    delete,
    path = "/api/gov/{id}",
    params(("id" = u64, Path, description = "Member id")),
    tag = "Student government",
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_gov_member(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    GovRepository::new(&state.db).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::tests::caller;
    use crate::auth::Role;

    fn member(name: &str, order: i32) -> NewGovMember {
        NewGovMember {
            name: name.into(),
            role_title: "Member".into(),
            photo_url: None,
            contact_url: None,
            display_order: order,
        }
    }

    #[tokio::test]
    async fn members_listed_in_display_order() {
        let (state, _dir) = AppState::for_tests();
        for (name, order) in [("Second", 2), ("First", 1)] {
            let (status, Json(created)) = create_gov_member(
                State(state.clone()),
                AdminOnly(caller(1, Role::Admin)),
                Json(member(name, order)),
            )
            .await
            .unwrap();
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(created.display_order, order);
        }

        let Json(members) = list_gov(State(state), Auth(caller(2, Role::Guest))).await.unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn blank_role_title_is_rejected() {
        let (state, _dir) = AppState::for_tests();
        let mut new = member("Ada", 0);
        new.role_title = String::new();
        let err = create_gov_member(State(state), AdminOnly(caller(1, Role::Admin)), Json(new))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
