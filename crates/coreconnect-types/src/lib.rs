//! Shared data model for the Core Connect auth client.

pub mod credentials;
pub mod tokens;
pub mod user;

pub use credentials::{LoginCredentials, SignupCredentials};
pub use tokens::{AuthTokens, BEARER, RefreshedToken};
pub use user::{Role, User, UserPatch};
