// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound HTTP collaborators.
//!
//! Each client owns a `reqwest::Client` with its own timeout and fails closed
//! with a typed error.

pub mod ai;
pub mod school;
pub mod telegram;

pub use ai::{AiError, AiGateway};
pub use school::{HttpSchoolGateway, SchoolError, SchoolGateway, SchoolLevel, SchoolProfile};
pub use telegram::{Broadcaster, DeliverySink, TelegramError, TelegramGateway, TracingSink};
