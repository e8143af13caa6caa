//! Credentials submitted by the login and signup forms.

use serde::{Deserialize, Serialize};

/// Email/password pair for `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration form. `confirm_password` is checked locally and never sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCredentials {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl SignupCredentials {
    /// Returns true if both password fields match.
    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }
}
