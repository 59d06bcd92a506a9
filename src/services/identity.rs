// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Telegram login and bootstrap admin promotion.

use subtle::ConstantTimeEq;

use crate::auth::{InitDataVerifier, Role, VerificationError};
use crate::config::AdminCredentials;
use crate::storage::{Database, StoreError, User, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("admin bootstrap is disabled")]
    AdminBootstrapDisabled,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Verify `initData` and register or refresh the user it names.
///
/// Profile fields follow the latest claim; the stored role is carried forward.
pub fn authenticate_with_init_data(
    verifier: &InitDataVerifier,
    db: &Database,
    raw: &str,
) -> Result<User, IdentityError> {
    let init_data = verifier.verify(raw)?;
    let user = UserRepository::new(db).upsert_telegram(&init_data.user)?;
    tracing::info!(
        user_id = user.id,
        telegram_id = user.telegram_id,
        role = %user.role,
        "Telegram login"
    );
    Ok(user)
}

/// Promote `user_id` to admin if the bootstrap credentials match.
///
/// Without configured credentials no caller can be promoted this way.
pub fn promote_with_admin_credentials(
    db: &Database,
    expected: Option<&AdminCredentials>,
    user_id: u64,
    username: &str,
    password: &str,
) -> Result<User, IdentityError> {
    let Some(expected) = expected else {
        tracing::warn!(user_id, "Admin bootstrap attempted while disabled");
        return Err(IdentityError::AdminBootstrapDisabled);
    };
    let username_ok = constant_time_eq(username, &expected.username);
    let password_ok = constant_time_eq(password, &expected.password);
    if !(username_ok & password_ok) {
        tracing::warn!(user_id, "Rejected admin bootstrap attempt");
        return Err(IdentityError::InvalidAdminCredentials);
    }
    let user = UserRepository::new(db).escalate_role(user_id, Role::Admin)?;
    tracing::info!(user_id, "User promoted to admin");
    Ok(user)
}

fn constant_time_eq(given: &str, expected: &str) -> bool {
    let given = given.as_bytes();
    let expected = expected.as_bytes();
    given.len() == expected.len() && given.ct_eq(expected).unwrap_u8() == 1
}
