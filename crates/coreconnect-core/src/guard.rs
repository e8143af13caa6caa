//! Route guard for protected locations.
//!
//! The guard is a pure predicate over the auth state. Callers are expected to
//! consult it only after the store has hydrated.

use std::fmt;

use crate::config::Config;
use crate::state::AuthState;

/// A navigable location: path plus optional query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    /// Query string including the leading `?`, or empty
    pub search: String,
}

impl Location {
    /// Parses `"/path?query"`. A missing leading slash is added.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, query),
            None => (input, ""),
        };

        let pathname = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let search = if query.is_empty() {
            String::new()
        } else {
            format!("?{query}")
        };

        Self { pathname, search }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pathname, self.search)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send the user to `to`, remembering where they were headed.
    Redirect { to: String, from: Location },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new("/login")
    }
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.login_path.clone())
    }

    pub fn check(&self, state: &AuthState, location: &Location) -> GuardDecision {
        if state.is_authenticated {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect {
                to: self.login_path.clone(),
                from: location.clone(),
            }
        }
    }
}

/// Where to land after a successful login.
pub fn post_login_target(from: Option<&Location>, default: &str) -> String {
    from.map_or_else(|| default.to_string(), Location::to_string)
}

#[cfg(test)]
mod tests {
    use coreconnect_types::AuthTokens;

    use super::*;

    fn authenticated() -> AuthState {
        AuthState {
            user: Some(serde_json::from_str(r#"{"id": "u1", "email": "a@b.c"}"#).unwrap()),
            tokens: Some(AuthTokens::new("a".into(), "r".into(), 900)),
            is_authenticated: true,
            ..AuthState::default()
        }
    }

    #[test]
    fn test_location_parse() {
        let loc = Location::parse("/payroll?month=3");
        assert_eq!(loc.pathname, "/payroll");
        assert_eq!(loc.search, "?month=3");
        assert_eq!(loc.to_string(), "/payroll?month=3");

        let loc = Location::parse("dashboard");
        assert_eq!(loc.pathname, "/dashboard");
        assert_eq!(loc.search, "");
    }

    #[test]
    fn test_authenticated_is_allowed() {
        let guard = RouteGuard::default();
        let decision = guard.check(&authenticated(), &Location::parse("/employees"));
        assert_eq!(decision, GuardDecision::Allow);
    }

    #[test]
    fn test_unauthenticated_is_redirected_with_origin() {
        let guard = RouteGuard::default();
        let decision = guard.check(&AuthState::default(), &Location::parse("/leave?tab=pending"));
        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: "/login".to_string(),
                from: Location::parse("/leave?tab=pending"),
            }
        );
    }

    #[test]
    fn test_loading_does_not_grant_access() {
        let state = AuthState {
            is_loading: true,
            ..AuthState::default()
        };
        let guard = RouteGuard::new("/signin");
        assert!(matches!(
            guard.check(&state, &Location::parse("/")),
            GuardDecision::Redirect { to, .. } if to == "/signin"
        ));
    }

    #[test]
    fn test_post_login_target() {
        let from = Location::parse("/leave?tab=pending");
        assert_eq!(post_login_target(Some(&from), "/dashboard"), "/leave?tab=pending");
        assert_eq!(post_login_target(None, "/dashboard"), "/dashboard");
    }
}
