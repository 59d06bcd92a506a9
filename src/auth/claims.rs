// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated caller representation.

use super::init_data::InitData;
use super::roles::Role;
use crate::storage::User;

/// The caller of an authenticated request.
///
/// Built by the auth gate after the `initData` signature checks out and the
/// Telegram id resolves to a registered user. Handlers obtain it through the
/// [`Auth`](super::Auth) family of extractors.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Directory record as of this request
    pub user: User,

    /// Verified `initData` the request carried
    pub init_data: InitData,
}

impl AuthenticatedUser {
    pub fn new(user: User, init_data: InitData) -> Self {
        Self { user, init_data }
    }

    /// Internal user id.
    pub fn id(&self) -> u64 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Utc;

    use super::*;
    use crate::auth::TelegramUser;

    /// Build a caller without touching the database.
    pub(crate) fn caller(id: u64, role: Role) -> AuthenticatedUser {
        let claim = TelegramUser {
            id: 1000 + id as i64,
            first_name: Some("Test".into()),
            last_name: None,
            username: None,
            photo_url: None,
            language_code: None,
            is_premium: false,
        };
        let now = Utc::now();
        let user = User {
            id,
            telegram_id: claim.id,
            username: None,
            first_name: claim.first_name.clone(),
            last_name: None,
            photo_url: None,
            role,
            school_login: None,
            school_level: 0,
            school_xp: 0,
            audit_ratio: 0.0,
            coins: 0,
            created_at: now,
            updated_at: now,
        };
        AuthenticatedUser::new(
            user,
            InitData {
                user: claim,
                auth_date: now,
                query_id: None,
                start_param: None,
            },
        )
    }

    #[test]
    fn club_leader_is_not_admin() {
        let leader = caller(1, Role::ClubLeader);
        assert!(!leader.is_admin());
        assert_eq!(leader.role(), Role::ClubLeader);
    }

    #[test]
    fn admin_is_admin() {
        let admin = caller(2, Role::Admin);
        assert!(admin.is_admin());
        assert_eq!(admin.id(), 2);
        assert_eq!(admin.role(), Role::Admin);
    }
}
