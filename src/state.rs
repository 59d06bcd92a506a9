// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthGate, InitDataVerifier, PublicRoutePolicy};
use crate::config::Config;
use crate::providers::{
    AiError, AiGateway, Broadcaster, HttpSchoolGateway, SchoolError, TelegramError,
    TelegramGateway, TracingSink,
};
use crate::storage::Database;

/// Failure to assemble the outbound clients at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("school client: {0}")]
    School(#[from] SchoolError),

    #[error("telegram client: {0}")]
    Telegram(#[from] TelegramError),

    #[error("ai client: {0}")]
    Ai(#[from] AiError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub gate: AuthGate,
    pub school: Arc<HttpSchoolGateway>,
    pub broadcaster: Broadcaster,
    pub ai: Arc<AiGateway>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>) -> Result<Self, StateError> {
        let verifier = InitDataVerifier::new(config.bot_token.clone(), config.init_data_max_age);
        let gate = AuthGate::new(verifier, db.clone(), PublicRoutePolicy::campus());

        let school = HttpSchoolGateway::new(config.school_api_base_url.clone())?;
        let telegram =
            TelegramGateway::new(config.telegram_api_base_url.clone(), config.bot_token.clone())?;
        let ai = AiGateway::new(config.openai_api_base_url.clone(), config.openai_api_key.clone())?;

        Ok(Self {
            config: Arc::new(config),
            db,
            gate,
            school: Arc::new(school),
            broadcaster: Broadcaster::new(telegram, Arc::new(TracingSink)),
            ai: Arc::new(ai),
        })
    }
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// State over a fresh database in a temporary directory.
    pub(crate) fn for_tests() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path());
        let db = Arc::new(Database::open(&config.database_path()).unwrap());
        (Self::new(config, db).unwrap(), dir)
    }
}
