//! Content-addressed cache in front of the decryption service.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{UnpackAuth, UnpackClient};
use crate::chart::{DecryptError, Decryptor};

/// Title of the service command that decrypts chart files.
pub const DECRYPT_COMMAND_TITLE: &str = "DJMax *.pt decrypt";

const TOKEN_FILE: &str = "token.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// A [`Decryptor`] that keys decrypted buffers by the SHA-256 of their
/// encrypted input.
///
/// Each distinct encrypted file is exchanged through the service at most
/// once; subsequent loads are served from `cache_dir`. The session token is
/// persisted next to the cached files and reused across processes until the
/// service rejects it.
#[derive(Debug)]
pub struct CachedDecryptor {
    cache_dir: PathBuf,
    command_title: String,
    client: UnpackClient,
}

impl CachedDecryptor {
    /// Create a decryptor caching under `cache_dir`, using the default
    /// service account and command title.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_auth(cache_dir, UnpackAuth::default())
    }

    /// Create a decryptor with explicit connection settings.
    #[must_use]
    pub fn with_auth(cache_dir: impl Into<PathBuf>, auth: UnpackAuth) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            command_title: DECRYPT_COMMAND_TITLE.into(),
            client: UnpackClient::new(auth),
        }
    }

    /// Override the command title looked up on the service.
    pub fn set_command_title(&mut self, title: impl Into<String>) {
        self.command_title = title.into();
    }

    /// Path a given encrypted buffer would be cached at.
    #[must_use]
    pub fn cache_path(&self, raw: &[u8]) -> PathBuf {
        let digest = Sha256::digest(raw);
        self.cache_dir.join(format!("{}.pt", hex::encode(digest)))
    }

    fn token_path(&self) -> PathBuf {
        self.cache_dir.join(TOKEN_FILE)
    }

    fn load_stored_token(path: &Path) -> Option<String> {
        let text = fs::read_to_string(path).ok()?;
        let stored: StoredToken = serde_json::from_str(&text).ok()?;
        Some(stored.token)
    }

    fn persist_token(&self, token: &str) -> Result<(), DecryptError> {
        let stored = StoredToken {
            token: token.into(),
        };
        let text = serde_json::to_string(&stored)
            .map_err(|err| DecryptError::Service(err.to_string()))?;
        fs::write(self.token_path(), text)?;
        Ok(())
    }

    /// Establish a usable session and return the id of the decrypt command.
    ///
    /// A persisted token is tried first; when the service rejects it, the
    /// client re-authenticates and the fresh token replaces the stored one.
    fn decrypt_command_id(&mut self) -> Result<u64, DecryptError> {
        if self.client.token().is_none() {
            if let Some(token) = Self::load_stored_token(&self.token_path()) {
                self.client.set_token(token);
            } else {
                let token = self.client.authenticate()?;
                self.persist_token(&token)?;
            }
        }

        let commands = match self.client.available_commands() {
            Ok(commands) => commands,
            Err(_) => {
                log::debug!("stored token rejected, re-authenticating");
                let token = self.client.authenticate()?;
                self.persist_token(&token)?;
                self.client.available_commands()?
            }
        };

        commands
            .iter()
            .find(|entry| entry.command_title == self.command_title)
            .map(|entry| entry.command_id)
            .ok_or_else(|| {
                DecryptError::Service(format!(
                    "service offers no command titled {:?}",
                    self.command_title
                ))
            })
    }
}

impl Decryptor for CachedDecryptor {
    fn decrypt(&mut self, raw: &[u8]) -> Result<Vec<u8>, DecryptError> {
        fs::create_dir_all(&self.cache_dir)?;

        let path = self.cache_path(raw);
        if path.is_file() {
            log::debug!("cache hit for {}", path.display());
            return Ok(fs::read(&path)?);
        }

        let command_id = self.decrypt_command_id()?;
        log::info!("exchanging {} bytes through decrypt service", raw.len());
        let plain = self.client.exchange(command_id, raw)?;
        fs::write(&path, &plain)?;
        Ok(plain)
    }
}
