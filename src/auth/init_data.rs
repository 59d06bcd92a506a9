// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Telegram Mini App `initData` verification.
//!
//! The Mini App receives a URL-encoded `initData` string from Telegram and
//! forwards it verbatim. Telegram signs it with a key derived from the bot
//! token:
//!
//! ```text
//! secret_key       = HMAC_SHA256(key = "WebAppData", msg = bot_token)
//! data_check_string = sorted "key=value" pairs except `hash`, joined by '\n'
//! hash             = hex(HMAC_SHA256(key = secret_key, msg = data_check_string))
//! ```
//!
//! The signature is checked first (constant time), then freshness, and only
//! then is the `user` JSON parsed.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use utoipa::ToSchema;

type HmacSha256 = Hmac<Sha256>;

/// Key used to derive the per-bot secret.
const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Default freshness window for `auth_date`.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Reasons an `initData` payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("init data is not signed")]
    MissingSignature,

    #[error("init data signature is invalid")]
    BadSignature,

    #[error("init data has expired")]
    Expired,

    #[error("malformed init data: {0}")]
    Malformed(String),
}

/// The Telegram user embedded in `initData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

/// A verified `initData` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InitData {
    pub user: TelegramUser,
    pub auth_date: DateTime<Utc>,
    pub query_id: Option<String>,
    pub start_param: Option<String>,
}

/// Verifies `initData` signatures for one bot.
#[derive(Clone)]
pub struct InitDataVerifier {
    bot_token: String,
    max_age: Duration,
}

impl std::fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("bot_token", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl InitDataVerifier {
    pub fn new(bot_token: impl Into<String>, max_age: Duration) -> Self {
        Self {
            bot_token: bot_token.into(),
            max_age,
        }
    }

    pub fn verify(&self, raw: &str) -> Result<InitData, VerificationError> {
        self.verify_at(raw, Utc::now())
    }

    /// Verify `raw` as if the current time were `now`.
    pub fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> Result<InitData, VerificationError> {
        let mut fields: BTreeMap<String, String> = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let hash = fields
            .remove("hash")
            .filter(|h| !h.is_empty())
            .ok_or(VerificationError::MissingSignature)?;
        let provided = hex::decode(&hash)
            .map_err(|_| VerificationError::Malformed("hash is not hex".into()))?;

        let mut mac = self.signing_mac()?;
        mac.update(data_check_string(&fields).as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| VerificationError::BadSignature)?;

        let auth_date = fields
            .get("auth_date")
            .ok_or_else(|| VerificationError::Malformed("missing auth_date".into()))?
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| VerificationError::Malformed("invalid auth_date".into()))?;

        let age = now.signed_duration_since(auth_date);
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        if age.num_seconds() > max_age {
            return Err(VerificationError::Expired);
        }

        let user_json = fields
            .get("user")
            .ok_or_else(|| VerificationError::Malformed("missing user".into()))?;
        let user: TelegramUser = serde_json::from_str(user_json)
            .map_err(|e| VerificationError::Malformed(format!("invalid user: {e}")))?;
        if user.id == 0 {
            return Err(VerificationError::Malformed("user id is zero".into()));
        }

        Ok(InitData {
            user,
            auth_date,
            query_id: fields.remove("query_id"),
            start_param: fields.remove("start_param"),
        })
    }

    /// MAC keyed with the bot's derived secret.
    fn signing_mac(&self) -> Result<HmacSha256, VerificationError> {
        let mut derive = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)
            .map_err(|e| VerificationError::Malformed(format!("HMAC init failed: {e}")))?;
        derive.update(self.bot_token.as_bytes());
        let secret_key = derive.finalize().into_bytes();
        HmacSha256::new_from_slice(&secret_key)
            .map_err(|e| VerificationError::Malformed(format!("HMAC init failed: {e}")))
    }
}

/// Sorted `key=value` lines, `hash` already removed.
fn data_check_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) const BOT_TOKEN: &str = "123456:TEST-bot-token";

    /// Produce a correctly signed `initData` query string.
    pub(crate) fn sign(bot_token: &str, fields: &[(&str, &str)]) -> String {
        let map: BTreeMap<String, String> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let verifier = InitDataVerifier::new(bot_token, DEFAULT_MAX_AGE);
        let mut mac = verifier.signing_mac().unwrap();
        mac.update(data_check_string(&map).as_bytes());
        let hash = hex::encode(mac.finalize().into_bytes());

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in fields {
            serializer.append_pair(k, v);
        }
        serializer.append_pair("hash", &hash);
        serializer.finish()
    }

    /// Signed `initData` for `telegram_id`, issued now.
    pub(crate) fn signed_for(telegram_id: i64, first_name: &str) -> String {
        let user = format!(r#"{{"id":{telegram_id},"first_name":"{first_name}"}}"#);
        let auth_date = Utc::now().timestamp().to_string();
        sign(
            BOT_TOKEN,
            &[("auth_date", &auth_date), ("query_id", "AAE1"), ("user", &user)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{sign, BOT_TOKEN};
    use super::*;

    const USER: &str = r#"{"id":4242,"first_name":"Ada","username":"ada","language_code":"en"}"#;

    fn verifier() -> InitDataVerifier {
        InitDataVerifier::new(BOT_TOKEN, DEFAULT_MAX_AGE)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn valid_payload_verifies() {
        let raw = sign(
            BOT_TOKEN,
            &[("auth_date", "1700000000"), ("query_id", "q1"), ("user", USER)],
        );
        let data = verifier().verify_at(&raw, at(1_700_000_100)).unwrap();

        assert_eq!(data.user.id, 4242);
        assert_eq!(data.user.username.as_deref(), Some("ada"));
        assert_eq!(data.query_id.as_deref(), Some("q1"));
        assert_eq!(data.auth_date, at(1_700_000_000));
        assert!(data.start_param.is_none());
    }

    #[test]
    fn any_single_character_tamper_fails() {
        let raw = sign(BOT_TOKEN, &[("auth_date", "1700000000"), ("user", USER)]);
        let verifier = verifier();
        let hash_start = raw.find("hash=").unwrap();

        for i in 0..hash_start {
            let mut bytes = raw.clone().into_bytes();
            let original = bytes[i];
            bytes[i] = if original == b'1' { b'2' } else { b'1' };
            let tampered = String::from_utf8(bytes).unwrap();
            let result = verifier.verify_at(&tampered, at(1_700_000_100));
            assert!(result.is_err(), "tamper at {i} accepted: {tampered}");
        }
    }

    #[test]
    fn tampered_hash_is_bad_signature() {
        let raw = sign(BOT_TOKEN, &[("auth_date", "1700000000"), ("user", USER)]);
        let last = raw.chars().last().unwrap();
        let replacement = if last == '0' { '1' } else { '0' };
        let tampered = format!("{}{replacement}", &raw[..raw.len() - 1]);

        assert_eq!(
            verifier().verify_at(&tampered, at(1_700_000_100)),
            Err(VerificationError::BadSignature)
        );
    }

    #[test]
    fn wrong_bot_token_is_bad_signature() {
        let raw = sign("999:other", &[("auth_date", "1700000000"), ("user", USER)]);
        assert_eq!(
            verifier().verify_at(&raw, at(1_700_000_100)),
            Err(VerificationError::BadSignature)
        );
    }

    #[test]
    fn stale_payload_is_expired() {
        let raw = sign(BOT_TOKEN, &[("auth_date", "1700000000"), ("user", USER)]);
        let day = DEFAULT_MAX_AGE.as_secs() as i64;

        assert!(verifier().verify_at(&raw, at(1_700_000_000 + day)).is_ok());
        assert_eq!(
            verifier().verify_at(&raw, at(1_700_000_000 + day + 1)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn huge_max_age_never_expires() {
        let raw = sign(BOT_TOKEN, &[("auth_date", "1700000000"), ("user", USER)]);
        let verifier = InitDataVerifier::new(BOT_TOKEN, Duration::from_secs(u64::MAX));

        assert!(verifier.verify_at(&raw, at(1_900_000_000)).is_ok());
    }

    #[test]
    fn missing_hash_is_missing_signature() {
        assert_eq!(
            verifier().verify("auth_date=1700000000&user=%7B%7D"),
            Err(VerificationError::MissingSignature)
        );
        assert_eq!(verifier().verify(""), Err(VerificationError::MissingSignature));
    }

    #[test]
    fn non_hex_hash_is_malformed() {
        assert!(matches!(
            verifier().verify("auth_date=1&hash=zz"),
            Err(VerificationError::Malformed(_))
        ));
    }

    #[test]
    fn signed_but_incomplete_payloads_are_malformed() {
        let no_user = sign(BOT_TOKEN, &[("auth_date", "1700000000")]);
        let zero_id = sign(
            BOT_TOKEN,
            &[("auth_date", "1700000000"), ("user", r#"{"id":0}"#)],
        );
        let no_date = sign(BOT_TOKEN, &[("user", USER)]);

        for raw in [no_user, zero_id, no_date] {
            assert!(matches!(
                verifier().verify_at(&raw, at(1_700_000_100)),
                Err(VerificationError::Malformed(_))
            ));
        }
    }
}
