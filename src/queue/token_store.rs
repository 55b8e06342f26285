//! Durable storage for the backend auth token.
//!
//! The token is the only state that survives a restart; the in-memory queue
//! does not.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::persist::{StoreError, read_json, write_json};

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StoreError>;

    async fn save(&self, token: &str) -> Result<(), StoreError>;
}

/// Token kept in process memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.current())
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    auth_token: Option<String>,
}

/// Token persisted as `{"auth_token": "..."}` in a JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        let file: Option<SessionFile> = read_json(&self.path).await?;
        Ok(file.and_then(|f| f.auth_token).filter(|t| !t.is_empty()))
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        write_json(
            &self.path,
            &SessionFile {
                auth_token: Some(token.to_string()),
            },
        )
        .await
    }
}
