// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the campus database.
//!
//! Each repository borrows the [`Database`](super::Database) and owns the
//! transactions for one entity type. Operations that touch several tables
//! (upsert, purchase, check-in, cascading deletes) do so in a single write
//! transaction.

pub mod attendance;
pub mod clubs;
pub mod gov;
pub mod hackathons;
pub mod news;
pub mod shop;
pub mod users;

pub use attendance::{Attendance, AttendanceRepository, CheckInError};
pub use clubs::{Club, ClubRepository, ClubView, NewClub};
pub use gov::{GovMember, GovRepository, NewGovMember};
pub use hackathons::{
    ApplicationStatus, ApplicationWithUser, Hackathon, HackathonApplication, HackathonRepository,
    HackathonStatus, NewHackathon,
};
pub use news::{News, NewsInput, NewsRepository};
pub use shop::{LedgerError, NewShopItem, Purchase, ShopItem, ShopRepository, Stock};
pub use users::{SchoolData, User, UserRepository};
