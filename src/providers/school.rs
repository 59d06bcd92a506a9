// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! School platform gateway (sign-in + GraphQL).
//!
//! Flow for one verification:
//!
//! 1. `POST {base}/api/auth/signin` with HTTP Basic credentials returns a JWT,
//!    sometimes wrapped in JSON quotes
//! 2. GraphQL `user` query for the profile
//! 3. GraphQL `event_user` query (main curriculum event) for level and audit ratio
//! 4. GraphQL `transaction` query for XP, summed client side

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

/// Curriculum event whose `event_user` row carries level and audit ratio.
const CURRICULUM_EVENT_ID: u32 = 96;

const SIGNIN_PATH: &str = "/api/auth/signin";
const GRAPHQL_PATH: &str = "/api/graphql-engine/v1/graphql";

const PROFILE_QUERY: &str = "{ user { id login firstName lastName email } }";

const LEVEL_QUERY: &str = r#"query GetEventUserLevelsByLogin($login: String!, $eventId: Int!) {
  core: event_user(
    where: {eventId: {_eq: $eventId}, publicUser: {login: {_eq: $login}}}
    order_by: {userAuditRatio: desc}
  ) {
    level
    userAuditRatio
  }
}"#;

const XP_QUERY: &str = r#"query GetUserTransactions($userId: Int!) {
  transaction(where: {userId: {_eq: $userId}, type: {_eq: "xp"}}) {
    amount
  }
}"#;

#[derive(Debug, thiserror::Error)]
pub enum SchoolError {
    #[error("school rejected the credentials")]
    AuthenticationFailed,

    #[error("school request failed: {0}")]
    Request(String),

    #[error("school response was invalid: {0}")]
    InvalidResponse(String),
}

/// Profile returned by the school `user` query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolProfile {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Level and audit ratio on the curriculum event. Zero when not enrolled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchoolLevel {
    pub level: u32,
    pub audit_ratio: f64,
}

/// Collaborator contract for school verification.
pub trait SchoolGateway: Send + Sync {
    /// Exchange credentials for a session JWT.
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, SchoolError>> + Send;

    fn fetch_profile(
        &self,
        jwt: &str,
    ) -> impl Future<Output = Result<SchoolProfile, SchoolError>> + Send;

    fn fetch_level(
        &self,
        jwt: &str,
        login: &str,
    ) -> impl Future<Output = Result<SchoolLevel, SchoolError>> + Send;

    fn fetch_total_xp(
        &self,
        jwt: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<u64, SchoolError>> + Send;
}

/// HTTP implementation against the school platform.
#[derive(Debug, Clone)]
pub struct HttpSchoolGateway {
    base_url: String,
    http: Client,
}

impl HttpSchoolGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SchoolError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SchoolError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        jwt: &str,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T, SchoolError> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let response = self
            .http
            .post(format!("{}{GRAPHQL_PATH}", self.base_url))
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| SchoolError::Request(format!("GraphQL request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SchoolError::Request(format!("GraphQL returned {status}")));
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| SchoolError::InvalidResponse(format!("invalid GraphQL JSON: {e}")))?;

        if let Some(error) = envelope.errors.first() {
            return Err(SchoolError::InvalidResponse(error.message.clone()));
        }
        envelope
            .data
            .ok_or_else(|| SchoolError::InvalidResponse("GraphQL response has no data".into()))
    }

    fn signin_request(&self, username: &str, password: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{SIGNIN_PATH}", self.base_url))
            .basic_auth(username, Some(password))
    }
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct ProfileData {
    user: Vec<SchoolProfile>,
}

#[derive(Deserialize)]
struct LevelData {
    core: Vec<LevelRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelRow {
    #[serde(default)]
    level: u32,
    #[serde(default)]
    user_audit_ratio: Option<f64>,
}

#[derive(Deserialize)]
struct XpData {
    transaction: Vec<XpRow>,
}

#[derive(Deserialize)]
struct XpRow {
    amount: i64,
}

impl SchoolGateway for HttpSchoolGateway {
    async fn authenticate(&self, username: &str, password: &str) -> Result<String, SchoolError> {
        let response = self
            .signin_request(username, password)
            .send()
            .await
            .map_err(|e| SchoolError::Request(format!("sign-in request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SchoolError::AuthenticationFailed)
            }
            status => return Err(SchoolError::Request(format!("sign-in returned {status}"))),
        }

        let body = response
            .text()
            .await
            .map_err(|e| SchoolError::InvalidResponse(format!("unreadable sign-in body: {e}")))?;
        let token = unquote_token(&body);
        if token.is_empty() {
            return Err(SchoolError::InvalidResponse("sign-in returned an empty token".into()));
        }
        Ok(token.to_string())
    }

    async fn fetch_profile(&self, jwt: &str) -> Result<SchoolProfile, SchoolError> {
        let data: ProfileData = self.graphql(jwt, PROFILE_QUERY, None).await?;
        data.user
            .into_iter()
            .next()
            .ok_or_else(|| SchoolError::InvalidResponse("no user data returned".into()))
    }

    async fn fetch_level(&self, jwt: &str, login: &str) -> Result<SchoolLevel, SchoolError> {
        let variables = json!({ "login": login, "eventId": CURRICULUM_EVENT_ID });
        let data: LevelData = self.graphql(jwt, LEVEL_QUERY, Some(variables)).await?;
        Ok(data
            .core
            .first()
            .map(|row| SchoolLevel {
                level: row.level,
                audit_ratio: row.user_audit_ratio.unwrap_or(0.0),
            })
            .unwrap_or_default())
    }

    async fn fetch_total_xp(&self, jwt: &str, user_id: i64) -> Result<u64, SchoolError> {
        let variables = json!({ "userId": user_id });
        let data: XpData = self.graphql(jwt, XP_QUERY, Some(variables)).await?;
        let total: i64 = data.transaction.iter().map(|t| t.amount).sum();
        Ok(total.max(0) as u64)
    }
}

/// Strip surrounding whitespace and one pair of JSON quotes.
fn unquote_token(body: &str) -> &str {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed)
}
