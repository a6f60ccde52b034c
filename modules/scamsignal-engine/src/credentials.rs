//! Durable credential persistence behind a trait seam. The registry owns the
//! semantics; a store only reads and writes the whole credential file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ai_client::BackendId;

/// One stored backend credential. The active flag is NOT here; it is a
/// registry-level pointer kept in [`CredentialFile::active`], so at most one
/// backend can be active at any moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub backend: BackendId,
    pub secret: String,
}

/// The full persisted state: credential list (one per backend, latest write
/// wins) plus the active-backend pointer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialFile {
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub active: Option<BackendId>,
}

impl CredentialFile {
    pub fn upsert(&mut self, backend: BackendId, secret: String) {
        match self.credentials.iter_mut().find(|c| c.backend == backend) {
            Some(existing) => existing.secret = secret,
            None => self.credentials.push(Credential { backend, secret }),
        }
    }

    pub fn remove(&mut self, backend: BackendId) {
        self.credentials.retain(|c| c.backend != backend);
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<CredentialFile>;
    async fn save(&self, file: &CredentialFile) -> Result<()>;
}

/// JSON-file credential store: the smallest durable key-value persistence
/// that satisfies the contract.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<CredentialFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialFile::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn save(&self, file: &CredentialFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(file)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_existing_credential() {
        let mut file = CredentialFile::default();
        file.upsert(BackendId::Claude, "first".into());
        file.upsert(BackendId::Claude, "second".into());
        assert_eq!(file.credentials.len(), 1);
        assert_eq!(file.credentials[0].secret, "second");
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.json"));

        // Missing file reads as empty state.
        let empty = store.load().await.unwrap();
        assert!(empty.credentials.is_empty());
        assert!(empty.active.is_none());

        let mut file = CredentialFile::default();
        file.upsert(BackendId::OpenAi, "sk-proj-abcdefghijklmnopqrs".into());
        file.active = Some(BackendId::OpenAi);
        store.save(&file).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.credentials.len(), 1);
        assert_eq!(loaded.active, Some(BackendId::OpenAi));
    }
}
