//! Test doubles for the analysis core: in-memory stores and a scripted
//! backend adapter. No network, no disk, deterministic tests in
//! milliseconds.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use ai_client::{
    normalize::normalize, BackendDescriptor, BackendError, BackendId, RiskBackend,
};
use scamsignal_common::{AnalysisRequest, AnalysisResult, CommunitySignal, IdentifierKind, ReportSummary};

use crate::community::{CommunityStore, NewReport, SubmitOutcome};
use crate::credentials::{CredentialFile, CredentialStore};
use crate::registry::AdapterFactory;

// =============================================================================
// In-memory credential store
// =============================================================================

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<CredentialFile>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> CredentialFile {
        self.inner.lock().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<CredentialFile> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, file: &CredentialFile) -> Result<()> {
        *self.inner.lock().await = file.clone();
        Ok(())
    }
}

// =============================================================================
// In-memory community store
// =============================================================================

#[derive(Default)]
pub struct MemoryCommunityStore {
    signals: Mutex<HashMap<(String, IdentifierKind), CommunitySignal>>,
    submitted: Mutex<Vec<NewReport>>,
}

impl MemoryCommunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, identifier: &str, kind: IdentifierKind, signal: CommunitySignal) {
        self.signals
            .lock()
            .await
            .insert((identifier.to_string(), kind), signal);
    }

    pub async fn submitted(&self) -> Vec<NewReport> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl CommunityStore for MemoryCommunityStore {
    async fn lookup(
        &self,
        identifier: &str,
        kind: IdentifierKind,
    ) -> Result<Option<CommunitySignal>> {
        Ok(self
            .signals
            .lock()
            .await
            .get(&(identifier.to_string(), kind))
            .cloned())
    }

    async fn list_verified_reports(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ReportSummary>> {
        let signals = self.signals.lock().await;
        Ok(signals
            .iter()
            .find(|((id, _), _)| id == identifier)
            .map(|(_, signal)| signal.verified_reports.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn submit_report(&self, report: NewReport) -> Result<SubmitOutcome> {
        self.submitted.lock().await.push(report);
        Ok(SubmitOutcome {
            success: true,
            report_id: Some(Uuid::new_v4()),
        })
    }
}

// =============================================================================
// Scripted backend
// =============================================================================

/// A backend adapter with scripted behavior: accepts or rejects any
/// credential, replies with a fixed raw string (run through the real
/// normalizer), or fails like a dead upstream.
pub struct ScriptedBackend {
    id: BackendId,
    accept_credential: bool,
    reply: String,
    fail: bool,
    ready: bool,
}

impl ScriptedBackend {
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            accept_credential: true,
            reply: r#"{"risk_level": "safe", "confidence": 55, "urgency": "low"}"#.to_string(),
            fail: false,
            ready: false,
        }
    }

    /// Raw reply text returned by `analyze`, fed through the normalizer
    /// exactly as a live adapter would.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.accept_credential = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn scripted_failure(&self) -> BackendError {
        BackendError::Api {
            backend: self.id,
            status: 503,
            body: "scripted upstream failure".to_string(),
        }
    }
}

#[async_trait]
impl RiskBackend for ScriptedBackend {
    fn descriptor(&self) -> &'static BackendDescriptor {
        self.id.descriptor()
    }

    fn initialize(&mut self) -> bool {
        self.ready = self.accept_credential;
        self.ready
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        if self.fail {
            return Err(self.scripted_failure());
        }
        Ok(normalize(&self.reply))
    }

    async fn analyze_image(
        &self,
        _bytes: &[u8],
        _mime_type: &str,
    ) -> Result<AnalysisResult, BackendError> {
        if !self.descriptor().supports_images {
            return Err(BackendError::ImageUnsupported { backend: self.id });
        }
        if self.fail {
            return Err(self.scripted_failure());
        }
        Ok(normalize(&self.reply))
    }
}

/// Factory producing [`ScriptedBackend`]s with the given reply for every
/// backend kind.
pub fn scripted_factory(reply: impl Into<String>) -> AdapterFactory {
    let reply = reply.into();
    Arc::new(move |id, _secret| Box::new(ScriptedBackend::new(id).with_reply(reply.clone())))
}

/// Factory whose adapters fail every call, as if the upstream were down.
pub fn failing_factory() -> AdapterFactory {
    Arc::new(|id, _secret| Box::new(ScriptedBackend::new(id).failing()))
}

/// Factory whose adapters reject every credential at `initialize()`.
pub fn rejecting_factory() -> AdapterFactory {
    Arc::new(|id, _secret| Box::new(ScriptedBackend::new(id).rejecting_credentials()))
}
