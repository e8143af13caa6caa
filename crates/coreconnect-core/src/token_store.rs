//! Persistent storage for the signed-in session.
//!
//! The session is kept as one JSON blob (`session.json`) holding the token
//! pair and the user, written with restricted permissions (0600). A write is
//! all-or-nothing, so a reader never sees tokens without their user.
//! Tokens are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use coreconnect_types::{AuthTokens, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::paths;

/// The persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub tokens: AuthTokens,
    pub user: User,
}

/// Raw blob storage behind the token store.
pub trait TokenRepository: Send + Sync + 'static {
    /// Reads the raw blob, `None` when nothing is stored.
    fn read(&self) -> Result<Option<String>>;

    /// Replaces the blob.
    fn write(&self, contents: &str) -> Result<()>;

    /// Removes the blob. Removing nothing is not an error.
    fn remove(&self) -> Result<()>;
}

/// Session blob on disk.
#[derive(Debug, Clone)]
pub struct FileTokenRepository {
    path: PathBuf,
}

impl FileTokenRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository at `${CORECONNECT_HOME}/session.json`.
    pub fn at_default_path() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenRepository for FileTokenRepository {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session {}", self.path.display())),
        }
    }
}

/// In-memory repository, shareable across clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenRepository {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with raw contents, which need not be a valid session.
    pub fn seeded(raw: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// Current raw contents.
    pub fn raw(&self) -> Option<String> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenRepository for MemoryTokenRepository {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.raw())
    }

    fn write(&self, contents: &str) -> Result<()> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Typed access to the persisted session.
#[derive(Debug, Clone)]
pub struct TokenStore<R> {
    repo: R,
}

impl<R: TokenRepository> TokenStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads the stored session.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or is not a complete session.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        let Some(raw) = self.repo.read()? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .context("Failed to parse stored session")
    }

    /// Returns the tokens only when a complete session is stored.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or parsed.
    pub fn get(&self) -> Result<Option<AuthTokens>> {
        Ok(self.load()?.map(|session| session.tokens))
    }

    /// Persists tokens together with their user.
    ///
    /// # Errors
    /// Returns an error if the session cannot be serialized or written.
    pub fn set(&self, tokens: &AuthTokens, user: &User) -> Result<()> {
        let session = StoredSession {
            tokens: tokens.clone(),
            user: user.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&session).context("Failed to serialize session")?;
        self.repo.write(&contents)
    }

    /// Replaces the user of the stored session. Does nothing without one.
    ///
    /// # Errors
    /// Returns an error if the stored session cannot be read or rewritten.
    pub fn set_user(&self, user: &User) -> Result<()> {
        match self.load()? {
            Some(session) => self.set(&session.tokens, user),
            None => {
                debug!("no stored session, user not persisted");
                Ok(())
            }
        }
    }

    /// Removes everything stored.
    ///
    /// # Errors
    /// Returns an error if the blob exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        self.repo.remove()
    }

    /// Restores the session at startup.
    ///
    /// Unreadable, corrupt or partial data is wiped and treated as signed out.
    pub fn hydrate(&self) -> Option<StoredSession> {
        match self.load() {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "discarding unreadable stored session");
                if let Err(err) = self.clear() {
                    warn!(error = %format!("{err:#}"), "failed to wipe stored session");
                }
                None
            }
        }
    }
}
