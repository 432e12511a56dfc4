//! Continuation/session id persistence.
//!
//! The agent hands back an opaque continuation token during a run; the next
//! run for the same endpoint resumes from it. The store is consulted before
//! launch and updated at finalization when a new token was observed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the persistent store backend.
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("failed to read session store at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write session store at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("session store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Continuation id storage, one entry per endpoint.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, endpoint_id: &str) -> Option<String>;

    async fn put(&self, endpoint_id: &str, session_id: String) -> Result<(), SessionStoreError>;
}

/// In-memory store; the default for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemorySessionStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, endpoint_id: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(endpoint_id)
            .cloned()
    }

    async fn put(&self, endpoint_id: &str, session_id: String) -> Result<(), SessionStoreError> {
        self.map
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(endpoint_id.to_string(), session_id);
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Default)]
struct SessionFile {
    sessions: HashMap<String, String>,
}

/// JSON-file-backed store under the relay home directory.
pub struct FileSessionStore {
    path: PathBuf,
    map: tokio::sync::Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Load the store, starting empty when the file does not exist yet.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let path = path.into();

        let map = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let file: SessionFile =
                    serde_json::from_str(&content).map_err(|source| SessionStoreError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                file.sessions
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => {
                return Err(SessionStoreError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        Ok(Self {
            path,
            map: tokio::sync::Mutex::new(map),
        })
    }

    async fn persist(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| SessionStoreError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
            }
        }

        let file = SessionFile {
            sessions: map.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|source| {
            SessionStoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| SessionStoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, endpoint_id: &str) -> Option<String> {
        self.map.lock().await.get(endpoint_id).cloned()
    }

    async fn put(&self, endpoint_id: &str, session_id: String) -> Result<(), SessionStoreError> {
        let mut map = self.map.lock().await;
        map.insert(endpoint_id.to_string(), session_id);
        self.persist(&map).await
    }
}
