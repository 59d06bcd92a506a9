// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Telegram Mini App authentication for the campus API.
//!
//! ## Auth Flow
//!
//! 1. Telegram opens the Mini App and hands it a signed `initData` string
//! 2. The Mini App calls `POST /api/auth/telegram` once to register/refresh
//!    the user, then sends `Authorization: tma <initData>` on every request
//! 3. The server:
//!    - Recomputes the HMAC-SHA256 signature from the bot token
//!    - Rejects payloads older than the freshness window (24h by default)
//!    - Resolves the Telegram id to a registered user and its role
//!
//! ## Security
//!
//! - All non-public `/api` endpoints require authentication
//! - Signatures are compared in constant time
//! - Roles come from the user directory, never from the client

pub mod claims;
pub mod error;
pub mod extractor;
pub mod init_data;
pub mod middleware;
pub mod policy;
pub mod roles;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use init_data::{InitData, InitDataVerifier, TelegramUser, VerificationError};
pub use middleware::{auth_gate, AuthGate};
pub use policy::PublicRoutePolicy;
pub use roles::Role;
