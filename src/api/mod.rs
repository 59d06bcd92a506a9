// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{auth_gate, Role},
    error::ApiError,
    state::AppState,
    storage::{
        ApplicationStatus, ApplicationWithUser, Attendance, Club, ClubView, GovMember, Hackathon,
        HackathonApplication, HackathonStatus, News, NewClub, NewGovMember, NewHackathon,
        NewShopItem, NewsInput, Purchase, ShopItem, Stock, User,
    },
};

pub mod attendance;
pub mod auth;
pub mod clubs;
pub mod gov;
pub mod hackathons;
pub mod health;
pub mod news;
pub mod shop;
pub mod users;

/// Deadline for every inbound request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reject blank required text fields with a 400.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

fn cors(frontend_url: &str) -> CorsLayer {
    let allowed = frontend_url.trim_end_matches('/').to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin.to_str().is_ok_and(|o| o == allowed)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/telegram", post(auth::telegram_login))
        .route("/api/auth/school", post(auth::school_login))
        .route("/api/auth/admin", post(auth::admin_login))
        .route("/api/users/me", get(users::me))
        .route("/api/users/{id}/role", put(users::set_role))
        .route("/api/leaderboard", get(users::leaderboard))
        .route("/api/news", get(news::list_news).post(news::create_news))
        .route(
            "/api/news/{id}",
            get(news::get_news)
                .put(news::update_news)
                .delete(news::delete_news),
        )
        .route("/api/news/{id}/summary", post(news::summarize_news))
        .route(
            "/api/hackathons",
            get(hackathons::list_hackathons).post(hackathons::create_hackathon),
        )
        .route(
            "/api/hackathons/{id}",
            get(hackathons::get_hackathon).delete(hackathons::delete_hackathon),
        )
        .route("/api/hackathons/{id}/apply", post(hackathons::apply))
        .route(
            "/api/hackathons/{id}/applications",
            get(hackathons::list_applications),
        )
        .route("/api/clubs", get(clubs::list_clubs).post(clubs::create_club))
        .route(
            "/api/clubs/{id}",
            get(clubs::get_club).delete(clubs::delete_club),
        )
        .route("/api/clubs/{id}/join", post(clubs::join_club))
        .route("/api/clubs/{id}/leave", post(clubs::leave_club))
        .route("/api/gov", get(gov::list_gov).post(gov::create_gov_member))
        .route(
            "/api/gov/{id}",
            axum::routing::delete(gov::delete_gov_member),
        )
        .route("/api/attendance/check-in", post(attendance::check_in))
        .route("/api/attendance/me", get(attendance::my_attendance))
        .route("/api/shop", get(shop::list_items).post(shop::create_item))
        .route("/api/shop/{id}", axum::routing::delete(shop::delete_item))
        .route("/api/shop/{id}/buy", post(shop::buy_item))
        .route("/api/shop/purchases/me", get(shop::my_purchases))
        .route_layer(middleware::from_fn_with_state(state.gate.clone(), auth_gate));

    // Responds 408 once the deadline passes.
    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(REQUEST_TIMEOUT);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors(&state.config.frontend_url))
                .layer(timeout),
        )
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::telegram_login,
        auth::school_login,
        auth::admin_login,
        users::me,
        users::set_role,
        users::leaderboard,
        news::list_news,
        news::get_news,
        news::create_news,
        news::update_news,
        news::delete_news,
        news::summarize_news,
        hackathons::list_hackathons,
        hackathons::get_hackathon,
        hackathons::create_hackathon,
        hackathons::delete_hackathon,
        hackathons::apply,
        hackathons::list_applications,
        clubs::list_clubs,
        clubs::get_club,
        clubs::create_club,
        clubs::delete_club,
        clubs::join_club,
        clubs::leave_club,
        gov::list_gov,
        gov::create_gov_member,
        gov::delete_gov_member,
        attendance::check_in,
        attendance::my_attendance,
        shop::list_items,
        shop::create_item,
        shop::delete_item,
        shop::buy_item,
        shop::my_purchases
    ),
    components(
        schemas(
            health::HealthResponse,
            health::HealthChecks,
            auth::TelegramAuthRequest,
            auth::CredentialsRequest,
            auth::UserResponse,
            users::SetRoleRequest,
            users::LeaderboardEntry,
            news::SummaryResponse,
            hackathons::ApplyRequest,
            attendance::CheckInRequest,
            shop::PurchaseResponse,
            User,
            Role,
            News,
            NewsInput,
            Hackathon,
            HackathonStatus,
            NewHackathon,
            HackathonApplication,
            ApplicationStatus,
            ApplicationWithUser,
            Club,
            ClubView,
            NewClub,
            GovMember,
            NewGovMember,
            Attendance,
            ShopItem,
            NewShopItem,
            Stock,
            Purchase
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Telegram login, school verification and admin bootstrap"),
        (name = "Users", description = "Profiles, roles and the coin leaderboard"),
        (name = "News", description = "School news feed"),
        (name = "Hackathons", description = "Hackathons and team applications"),
        (name = "Clubs", description = "Clubs and memberships"),
        (name = "Student government", description = "Student government roster"),
        (name = "Attendance", description = "Event check-ins and coin rewards"),
        (name = "Shop", description = "Coin shop and purchase history")
    )
)]
struct ApiDoc;
