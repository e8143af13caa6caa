//! User identity record.
//!
//! Wire and persisted shapes are camelCase, matching the Core Connect API.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Role assigned to a user by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    #[serde(alias = "employee")]
    Employee,
    #[serde(alias = "hr")]
    Hr,
    #[serde(alias = "manager")]
    Manager,
    #[serde(alias = "admin")]
    Admin,
}

impl Role {
    /// Returns the wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::Hr => "HR",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treats an explicit `null` role the same as a missing one.
fn role_or_default<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Role>::deserialize(deserializer)?.unwrap_or_default())
}

/// Authenticated user as returned by login, signup and verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier (opaque, immutable)
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "role_or_default")]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    /// Server timestamp, kept verbatim (the backend emits naive ISO strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Returns "First Last" when both names are known, else the username, else the email.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self
                .username
                .clone()
                .unwrap_or_else(|| self.email.clone()),
        }
    }

    /// Applies a merge-patch: only fields present in the patch are replaced.
    pub fn apply_patch(&mut self, patch: UserPatch) {
        let UserPatch {
            email,
            first_name,
            last_name,
            username,
            role,
            is_verified,
            last_login,
        } = patch;

        if let Some(email) = email {
            self.email = email;
        }
        if first_name.is_some() {
            self.first_name = first_name;
        }
        if last_name.is_some() {
            self.last_name = last_name;
        }
        if username.is_some() {
            self.username = username;
        }
        if let Some(role) = role {
            self.role = role;
        }
        if let Some(is_verified) = is_verified {
            self.is_verified = is_verified;
        }
        if last_login.is_some() {
            self.last_login = last_login;
        }
    }
}

/// Partial user update. `id` and `created_at` are immutable and not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
    pub last_login: Option<String>,
}
