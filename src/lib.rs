// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Campus Hub - Telegram Mini App backend for the school community
//!
//! Students sign in with Telegram `initData`, optionally link their school
//! account, and earn coins for attending events that they spend in the shop.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - initData verification, the auth gate and role extractors
//! - `providers` - school platform, Telegram Bot API and OpenAI clients
//! - `services` - login, admin bootstrap and student verification flows
//! - `storage` - redb database and repositories

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod providers;
pub mod services;
pub mod state;
pub mod storage;
