// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public route allow-list for the auth gate.

use axum::http::Method;

/// Routes that may be called without `initData`.
///
/// Two kinds of entries:
/// - exact `(method, path)` pairs
/// - path prefixes open to `GET` only, matched on segment boundaries
///   (`/api/news` covers `/api/news` and `/api/news/7`, not `/api/newsletter`)
#[derive(Debug, Clone, Default)]
pub struct PublicRoutePolicy {
    exact: Vec<(Method, String)>,
    get_prefixes: Vec<String>,
}

impl PublicRoutePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow one exact method and path.
    pub fn allow(mut self, method: Method, path: impl Into<String>) -> Self {
        self.exact.push((method, path.into()));
        self
    }

    /// Allow `GET` on a path and everything below it.
    pub fn allow_get_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.get_prefixes.push(prefix.trim_end_matches('/').to_string());
        self
    }

    /// Policy for the campus API: health, login and the read-only feeds.
    pub fn campus() -> Self {
        Self::new()
            .allow(Method::GET, "/api/health")
            .allow(Method::POST, "/api/auth/telegram")
            .allow_get_prefix("/api/news")
            .allow_get_prefix("/api/hackathons")
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        if self.exact.iter().any(|(m, p)| m == method && p == path) {
            return true;
        }
        *method == Method::GET
            && self.get_prefixes.iter().any(|prefix| {
                path.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_entries_match_method_and_path() {
        let policy = PublicRoutePolicy::campus();
        assert!(policy.is_public(&Method::GET, "/api/health"));
        assert!(policy.is_public(&Method::POST, "/api/auth/telegram"));
        assert!(!policy.is_public(&Method::POST, "/api/health"));
        assert!(!policy.is_public(&Method::POST, "/api/auth/school"));
    }

    #[test]
    fn get_prefixes_respect_segments_and_method() {
        let policy = PublicRoutePolicy::campus();
        assert!(policy.is_public(&Method::GET, "/api/news"));
        assert!(policy.is_public(&Method::GET, "/api/news/12"));
        assert!(policy.is_public(&Method::GET, "/api/hackathons/3"));
        assert!(!policy.is_public(&Method::GET, "/api/newsletter"));
        assert!(!policy.is_public(&Method::POST, "/api/news"));
        assert!(!policy.is_public(&Method::DELETE, "/api/news/12"));
        assert!(!policy.is_public(&Method::GET, "/api/shop"));
    }

    #[test]
    fn empty_policy_is_closed() {
        assert!(!PublicRoutePolicy::new().is_public(&Method::GET, "/api/health"));
    }
}
