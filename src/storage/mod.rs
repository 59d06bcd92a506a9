// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single embedded [redb](https://docs.rs/redb)
//! database file (`$DATA_DIR/campus.redb`). redb is ACID with one writer at a
//! time, which is what makes the user upsert, the coin purchase and the
//! attendance credit atomic without any locking in this crate.
//!
//! ## Layout
//!
//! - [`database`]: table definitions, error type, row helpers
//! - [`repository`]: one typed repository per entity

pub mod database;
pub mod repository;

pub use database::{Conflict, Database, StoreError, StoreResult};
pub use repository::*;
