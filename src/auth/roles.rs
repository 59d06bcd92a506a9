// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// Roles are totally ordered: `Guest < Student < ClubLeader < Admin`.
///
/// - `Guest` - Authenticated through Telegram, not yet verified by the school
/// - `Student` - Verified against the school platform
/// - `ClubLeader` - Student who runs a club
/// - `Admin` - Full access to content management and the shop
///
/// A user's role only ever moves up. Re-authentication carries it forward
/// unchanged; privileged operations escalate it with [`Role::escalate`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Telegram identity only
    #[default]
    Guest,
    /// Verified school student
    Student,
    /// Club organizer
    ClubLeader,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Return the higher of the two roles.
    pub fn escalate(self, to: Role) -> Role {
        self.max(to)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Guest => write!(f, "guest"),
            Role::Student => write!(f, "student"),
            Role::ClubLeader => write!(f, "club_leader"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
