// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Flows that span a provider and the user directory.

pub mod identity;
pub mod school;

pub use identity::{authenticate_with_init_data, promote_with_admin_credentials, IdentityError};
pub use school::{verify_student, VerifyStudentError};
