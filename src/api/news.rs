// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::require_text;
use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    state::AppState,
    storage::{News, NewsInput, NewsRepository, UserRepository},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct NewsQuery {
    /// Only posts carrying this tag
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

fn validate(input: &NewsInput) -> Result<(), ApiError> {
    require_text("title", &input.title)?;
    require_text("content", &input.content)
}

/// Telegram HTML for a freshly published post.
fn announcement(news: &News) -> String {
    format!(
        "📰 <b>{}</b>\n\n{}",
        escape_html(&news.title),
        escape_html(&news.content)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[utoipa::path(
    get,
    path = "/api/news",
    params(NewsQuery),
    tag = "News",
    responses((status = 200, body = [News]))
)]
pub async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<News>>, ApiError> {
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    Ok(Json(NewsRepository::new(&state.db).list(tag)?))
}

#[utoipa::path(
    get,
    path = "/api/news/{id}",
    params(("id" = u64, Path, description = "News id")),
    tag = "News",
    responses((status = 200, body = News), (status = 404))
)]
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<News>, ApiError> {
    Ok(Json(NewsRepository::new(&state.db).get(id)?))
}

/// Publish a post and announce it to every registered user.
#[utoipa::path(
    post,
    path = "/api/news",
    request_body = NewsInput,
    tag = "News",
    responses((status = 201, body = News), (status = 400), (status = 403))
)]
pub async fn create_news(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Json(input): Json<NewsInput>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    validate(&input)?;
    let news = NewsRepository::new(&state.db).create(input, Some(admin.id()))?;
    tracing::info!(news_id = news.id, admin_id = admin.id(), "News published");

    match UserRepository::new(&state.db).telegram_ids() {
        Ok(chat_ids) => {
            state.broadcaster.broadcast(chat_ids, announcement(&news));
        }
        Err(e) => tracing::warn!(news_id = news.id, error = %e, "Skipping news broadcast"),
    }

    Ok((StatusCode::CREATED, Json(news)))
}

#[utoipa::path(
    put,
    path = "/api/news/{id}",
    params(("id" = u64, Path, description = "News id")),
    request_body = NewsInput,
    tag = "News",
    responses((status = 200, body = News), (status = 400), (status = 403), (status = 404))
)]
pub async fn update_news(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
    Json(input): Json<NewsInput>,
) -> Result<Json<News>, ApiError> {
    validate(&input)?;
    Ok(Json(NewsRepository::new(&state.db).update(id, input)?))
}

#[utoipa::path(
    delete,
    path = "/api/news/{id}",
    params(("id" = u64, Path, description = "News id")),
    tag = "News",
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_news(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    NewsRepository::new(&state.db).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Short AI-generated summary of a post.
#[utoipa::path(
    post,
    path = "/api/news/{id}/summary",
    params(("id" = u64, Path, description = "News id")),
    tag = "News",
    responses(
        (status = 200, body = SummaryResponse),
        (status = 404),
        (status = 502, description = "Summary provider failed"),
        (status = 503, description = "Summaries are not configured")
    )
)]
pub async fn summarize_news(
    State(state): State<AppState>,
    _caller: Auth,
    Path(id): Path<u64>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let news = NewsRepository::new(&state.db).get(id)?;
    let summary = state.ai.summarize(&news.title, &news.content).await?;
    Ok(Json(SummaryResponse { summary }))
}
