//! Process-wide backend credential state: which backends have usable
//! adapters, and which one is active.
//!
//! The registry is an explicitly constructed instance with injected
//! persistence and an injected adapter factory (no hidden global) so the
//! core stays unit-testable without touching the network or the disk.
//! All mutation goes through one write-lock boundary; reads take the read
//! side and observe a consistent snapshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{info, warn};

use ai_client::{BackendId, ClaudeBackend, OpenAiBackend, OpenRouterBackend, RiskBackend};
use scamsignal_common::Config;

use crate::credentials::CredentialStore;

/// Builds an adapter for a backend kind from a secret. Injected so tests can
/// substitute scripted adapters.
pub type AdapterFactory = Arc<dyn Fn(BackendId, &str) -> Box<dyn RiskBackend> + Send + Sync>;

/// The production factory: real provider adapters configured from [`Config`].
pub fn default_factory(config: &Config) -> AdapterFactory {
    let config = config.clone();
    Arc::new(move |backend, secret| {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        match backend {
            BackendId::Claude => Box::new(
                ClaudeBackend::new(secret, &config.claude_model)
                    .with_language(&config.reply_language)
                    .with_timeout(timeout),
            ),
            BackendId::OpenAi => Box::new(
                OpenAiBackend::new(secret, &config.openai_model)
                    .with_language(&config.reply_language)
                    .with_timeout(timeout),
            ),
            BackendId::OpenRouter => Box::new(
                OpenRouterBackend::new(secret, &config.openrouter_model)
                    .with_language(&config.reply_language)
                    .with_timeout(timeout),
            ),
        }
    })
}

/// Caller-facing view of one configured backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredBackend {
    pub backend: BackendId,
    pub name: &'static str,
    pub is_active: bool,
}

pub(crate) struct RegistryState {
    pub(crate) adapters: HashMap<BackendId, Box<dyn RiskBackend>>,
    pub(crate) active: Option<BackendId>,
}

impl RegistryState {
    fn usable(&self, backend: BackendId) -> bool {
        self.adapters
            .get(&backend)
            .is_some_and(|adapter| adapter.is_ready())
    }

    fn first_usable(&self) -> Option<BackendId> {
        let mut usable: Vec<BackendId> = self
            .adapters
            .iter()
            .filter(|(_, adapter)| adapter.is_ready())
            .map(|(id, _)| *id)
            .collect();
        usable.sort();
        usable.first().copied()
    }

    /// Invariant: the active pointer is None or refers to a usable adapter.
    fn repair_active(&mut self) {
        match self.active {
            Some(backend) if self.usable(backend) => {}
            _ => self.active = self.first_usable(),
        }
    }
}

pub struct CredentialRegistry {
    store: Arc<dyn CredentialStore>,
    factory: AdapterFactory,
    state: RwLock<RegistryState>,
}

impl CredentialRegistry {
    pub fn new(store: Arc<dyn CredentialStore>, factory: AdapterFactory) -> Self {
        Self {
            store,
            factory,
            state: RwLock::new(RegistryState {
                adapters: HashMap::new(),
                active: None,
            }),
        }
    }

    /// Rebuild in-memory adapters from every persisted credential, re-running
    /// the syntactic validation for each. A stale credential that now fails
    /// is skipped with a warning, not deleted, so it stays available for a
    /// future explicit retry.
    pub async fn load_from_store(&self) -> Result<()> {
        let file = self.store.load().await?;
        let mut state = self.state.write().await;

        for credential in &file.credentials {
            let mut adapter = (self.factory)(credential.backend, &credential.secret);
            if adapter.initialize() {
                state.adapters.insert(credential.backend, adapter);
            } else {
                warn!(
                    backend = %credential.backend,
                    "Stored credential fails validation, skipping"
                );
            }
        }

        state.active = file.active;
        state.repair_active();
        info!(
            usable = state.adapters.len(),
            active = ?state.active,
            "Credential registry loaded"
        );
        Ok(())
    }

    /// Configure (or re-configure) a backend. Returns Ok(false) without
    /// mutating any state when the credential fails the adapter's syntactic
    /// validation. On success the credential is persisted, and the backend is
    /// promoted to active iff there is currently no usable active backend.
    pub async fn set_credential(&self, backend: BackendId, secret: &str) -> Result<bool> {
        let mut adapter = (self.factory)(backend, secret);
        if !adapter.initialize() {
            warn!(backend = %backend, "Rejected malformed credential");
            return Ok(false);
        }

        let mut state = self.state.write().await;
        state.adapters.insert(backend, adapter);

        let has_usable_active = state.active.is_some_and(|active| state.usable(active));
        if !has_usable_active {
            state.active = Some(backend);
        }

        let mut file = self.store.load().await?;
        file.upsert(backend, secret.to_string());
        file.active = state.active;
        self.store.save(&file).await?;

        info!(backend = %backend, active = ?state.active, "Backend configured");
        Ok(true)
    }

    /// Delete a backend's credential and adapter. If it was active, the
    /// pointer moves to any other usable backend, or to none.
    pub async fn remove_credential(&self, backend: BackendId) -> Result<()> {
        let mut state = self.state.write().await;
        state.adapters.remove(&backend);
        if state.active == Some(backend) {
            state.active = None;
        }
        state.repair_active();

        let mut file = self.store.load().await?;
        file.remove(backend);
        file.active = state.active;
        self.store.save(&file).await?;

        info!(backend = %backend, active = ?state.active, "Backend removed");
        Ok(())
    }

    /// Point the active backend at `backend`. A no-op returning false when
    /// that backend has no usable adapter.
    pub async fn set_active(&self, backend: BackendId) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.usable(backend) {
            return Ok(false);
        }
        state.active = Some(backend);

        let mut file = self.store.load().await?;
        file.active = state.active;
        self.store.save(&file).await?;
        Ok(true)
    }

    pub async fn list_usable(&self) -> Vec<BackendId> {
        let state = self.state.read().await;
        let mut usable: Vec<BackendId> = state
            .adapters
            .iter()
            .filter(|(_, adapter)| adapter.is_ready())
            .map(|(id, _)| *id)
            .collect();
        usable.sort();
        usable
    }

    pub async fn has_usable(&self) -> bool {
        let state = self.state.read().await;
        state.adapters.values().any(|adapter| adapter.is_ready())
    }

    pub async fn active(&self) -> Option<BackendId> {
        self.state.read().await.active
    }

    pub async fn list_configured(&self) -> Vec<ConfiguredBackend> {
        let state = self.state.read().await;
        let mut configured: Vec<ConfiguredBackend> = state
            .adapters
            .iter()
            .filter(|(_, adapter)| adapter.is_ready())
            .map(|(id, _)| ConfiguredBackend {
                backend: *id,
                name: id.descriptor().name,
                is_active: state.active == Some(*id),
            })
            .collect();
        configured.sort_by_key(|c| c.backend);
        configured
    }

    pub(crate) fn state(&self) -> &RwLock<RegistryState> {
        &self.state
    }
}
