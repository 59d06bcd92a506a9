// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Student verification against the school platform.

use crate::providers::{SchoolError, SchoolGateway};
use crate::storage::{Database, SchoolData, StoreError, User, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum VerifyStudentError {
    #[error(transparent)]
    School(#[from] SchoolError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Confirm school credentials and record the student's standing.
///
/// Sign-in, profile and level are required. A failed XP lookup is logged and
/// recorded as zero. On success the role becomes at least `student`.
pub async fn verify_student<G: SchoolGateway>(
    gateway: &G,
    db: &Database,
    user_id: u64,
    username: &str,
    password: &str,
) -> Result<User, VerifyStudentError> {
    let jwt = gateway.authenticate(username, password).await?;
    let profile = gateway.fetch_profile(&jwt).await?;
    let level = gateway.fetch_level(&jwt, &profile.login).await?;
    let xp = match gateway.fetch_total_xp(&jwt, profile.id).await {
        Ok(xp) => xp,
        Err(e) => {
            tracing::warn!(
                user_id,
                login = %profile.login,
                error = %e,
                "XP lookup failed, recording 0"
            );
            0
        }
    };

    let data = SchoolData {
        login: profile.login,
        level: level.level,
        xp,
        audit_ratio: level.audit_ratio,
    };
    let user = UserRepository::new(db).update_school_data(user_id, &data)?;
    tracing::info!(user_id, login = %data.login, level = data.level, "Student verified");
    Ok(user)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::providers::{SchoolLevel, SchoolProfile};
    use crate::storage::database::tests::temp_db;
    use crate::storage::repository::users::tests::seed_user;

    /// In-memory school platform.
    pub(crate) struct StubSchool {
        pub(crate) password: &'static str,
        pub(crate) xp_fails: bool,
    }

    impl SchoolGateway for StubSchool {
        async fn authenticate(
            &self,
            username: &str,
            password: &str,
        ) -> Result<String, SchoolError> {
            if password == self.password {
                Ok(format!("jwt-{username}"))
            } else {
                Err(SchoolError::AuthenticationFailed)
            }
        }

        async fn fetch_profile(&self, jwt: &str) -> Result<SchoolProfile, SchoolError> {
            Ok(SchoolProfile {
                id: 77,
                login: jwt.trim_start_matches("jwt-").to_string(),
                first_name: None,
                last_name: None,
                email: None,
            })
        }

        async fn fetch_level(&self, _jwt: &str, _login: &str) -> Result<SchoolLevel, SchoolError> {
            Ok(SchoolLevel {
                level: 9,
                audit_ratio: 1.4,
            })
        }

        async fn fetch_total_xp(&self, _jwt: &str, _user_id: i64) -> Result<u64, SchoolError> {
            if self.xp_fails {
                Err(SchoolError::Request("timeout".into()))
            } else {
                Ok(250_000)
            }
        }
    }

    #[tokio::test]
    async fn successful_verification_promotes_guest() {
        let (db, _dir) = temp_db();
        let user = seed_user(&db, 1, Role::Guest, 0);
        let school = StubSchool {
            password: "pw",
            xp_fails: false,
        };

        let verified = verify_student(&school, &db, user.id, "ada", "pw").await.unwrap();

        assert_eq!(verified.role, Role::Student);
        assert_eq!(verified.school_login.as_deref(), Some("ada"));
        assert_eq!(verified.school_level, 9);
        assert_eq!(verified.school_xp, 250_000);
        assert_eq!(verified.audit_ratio, 1.4);
    }

    #[tokio::test]
    async fn xp_failure_degrades_to_zero() {
        let (db, _dir) = temp_db();
        let user = seed_user(&db, 1, Role::Guest, 0);
        let school = StubSchool {
            password: "pw",
            xp_fails: true,
        };

        let verified = verify_student(&school, &db, user.id, "ada", "pw").await.unwrap();
        assert_eq!(verified.school_xp, 0);
        assert_eq!(verified.role, Role::Student);
    }

    #[tokio::test]
    async fn rejected_credentials_change_nothing() {
        let (db, _dir) = temp_db();
        let user = seed_user(&db, 1, Role::Guest, 0);
        let school = StubSchool {
            password: "pw",
            xp_fails: false,
        };

        let err = verify_student(&school, &db, user.id, "ada", "nope").await.unwrap_err();

        assert!(matches!(err, VerifyStudentError::School(SchoolError::AuthenticationFailed)));
        let stored = UserRepository::new(&db).get(user.id).unwrap();
        assert_eq!(stored.role, Role::Guest);
        assert!(stored.school_login.is_none());
    }

    #[tokio::test]
    async fn admin_is_not_downgraded() {
        let (db, _dir) = temp_db();
        let admin = seed_user(&db, 1, Role::Admin, 0);
        let school = StubSchool {
            password: "pw",
            xp_fails: false,
        };

        let verified = verify_student(&school, &db, admin.id, "root", "pw").await.unwrap();
        assert_eq!(verified.role, Role::Admin);
    }
}
