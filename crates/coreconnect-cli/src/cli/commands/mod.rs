//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod session;

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use coreconnect_core::auth::{AuthClient, AuthClientConfig};
use coreconnect_core::config::Config;
use coreconnect_core::state::AuthStore;
use coreconnect_core::token_store::FileTokenRepository;

/// Builds the auth store over the session file in the Core Connect home.
pub(crate) fn open_store(config: &Config) -> Result<AuthStore<FileTokenRepository>> {
    let client_config = AuthClientConfig::from_config(config)?;
    let client = AuthClient::new(client_config).context("create auth client")?;
    Ok(AuthStore::new(client, FileTokenRepository::at_default_path()))
}

/// Returns the flag value, or reads one line from stdin.
pub(crate) fn secret_or_stdin(value: Option<&str>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value.to_string());
    }

    if io::stdin().is_terminal() {
        eprint!("{prompt}: ");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read from stdin")?;

    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        anyhow::bail!("{prompt} cannot be empty");
    }
    Ok(secret)
}
