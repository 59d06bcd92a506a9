// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. A missing
//! required value is a fatal startup error.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BOT_TOKEN` | Telegram bot token, signs `initData` | Required |
//! | `DATA_DIR` | Directory holding `campus.redb` | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `FRONTEND_URL` | Allowed CORS origin | `http://localhost:3000` |
//! | `OPENAI_API_KEY` | Key for news summaries | Optional (summaries disabled) |
//! | `ADMIN_USERNAME` | Bootstrap admin login | `admin` |
//! | `ADMIN_PASSWORD` | Bootstrap admin password | Unset (bootstrap disabled) |
//! | `SCHOOL_API_BASE_URL` | School platform base URL | `https://01.tomorrow-school.ai` |
//! | `TELEGRAM_API_BASE_URL` | Telegram Bot API base URL | `https://api.telegram.org` |
//! | `OPENAI_API_BASE_URL` | OpenAI API base URL | `https://api.openai.com` |
//! | `INIT_DATA_MAX_AGE_SECS` | `initData` freshness window | `86400` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ADMIN_USERNAME_ENV: &str = "ADMIN_USERNAME";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";
pub const SCHOOL_API_BASE_URL_ENV: &str = "SCHOOL_API_BASE_URL";
pub const TELEGRAM_API_BASE_URL_ENV: &str = "TELEGRAM_API_BASE_URL";
pub const OPENAI_API_BASE_URL_ENV: &str = "OPENAI_API_BASE_URL";
pub const INIT_DATA_MAX_AGE_ENV: &str = "INIT_DATA_MAX_AGE_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Database file name inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "campus.redb";

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_SCHOOL_API_BASE_URL: &str = "https://01.tomorrow-school.ai";
const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_OPENAI_API_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_INIT_DATA_MAX_AGE_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Bootstrap credentials for `POST /api/auth/admin`.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    /// Empty when summaries are disabled
    pub openai_api_key: Option<String>,
    /// `None` disables `POST /api/auth/admin`
    pub admin: Option<AdminCredentials>,
    pub school_api_base_url: String,
    pub telegram_api_base_url: String,
    pub openai_api_base_url: String,
    pub init_data_max_age: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("frontend_url", &self.frontend_url)
            .field("openai_configured", &self.openai_api_key.is_some())
            .field("admin", &self.admin)
            .field("school_api_base_url", &self.school_api_base_url)
            .field("telegram_api_base_url", &self.telegram_api_base_url)
            .field("openai_api_base_url", &self.openai_api_base_url)
            .field("init_data_max_age", &self.init_data_max_age)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or_default =
            |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let bot_token = get(BOT_TOKEN_ENV).ok_or(ConfigError::Missing(BOT_TOKEN_ENV))?;

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let max_age_secs = match get(INIT_DATA_MAX_AGE_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: INIT_DATA_MAX_AGE_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_INIT_DATA_MAX_AGE_SECS,
        };

        let admin = match get(ADMIN_PASSWORD_ENV) {
            Some(password) => {
                let username = or_default(ADMIN_USERNAME_ENV, DEFAULT_ADMIN_USERNAME);
                if username == DEFAULT_ADMIN_USERNAME && password == DEFAULT_ADMIN_USERNAME {
                    return Err(ConfigError::Invalid {
                        name: ADMIN_PASSWORD_ENV,
                        reason: "admin/admin is not accepted as bootstrap credentials".into(),
                    });
                }
                Some(AdminCredentials { username, password })
            }
            None => None,
        };

        Ok(Self {
            bot_token,
            data_dir: PathBuf::from(or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR)),
            host: or_default(HOST_ENV, DEFAULT_HOST),
            port,
            frontend_url: or_default(FRONTEND_URL_ENV, DEFAULT_FRONTEND_URL),
            openai_api_key: get(OPENAI_API_KEY_ENV),
            admin,
            school_api_base_url: or_default(SCHOOL_API_BASE_URL_ENV, DEFAULT_SCHOOL_API_BASE_URL),
            telegram_api_base_url: or_default(
                TELEGRAM_API_BASE_URL_ENV,
                DEFAULT_TELEGRAM_API_BASE_URL,
            ),
            openai_api_base_url: or_default(OPENAI_API_BASE_URL_ENV, DEFAULT_OPENAI_API_BASE_URL),
            init_data_max_age: Duration::from_secs(max_age_secs),
        })
    }

    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for unit tests. Outbound URLs point at a closed port.
    pub(crate) fn for_tests(data_dir: &std::path::Path) -> Self {
        Self::from_lookup(|name| match name {
            BOT_TOKEN_ENV => Some(crate::auth::init_data::test_support::BOT_TOKEN.to_string()),
            DATA_DIR_ENV => Some(data_dir.display().to_string()),
            SCHOOL_API_BASE_URL_ENV | TELEGRAM_API_BASE_URL_ENV | OPENAI_API_BASE_URL_ENV => {
                Some("http://127.0.0.1:9".to_string())
            }
            _ => None,
        })
        .unwrap()
    }
}
