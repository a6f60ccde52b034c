//! Routes one analysis call to the active backend adapter. A single attempt
//! per call; retries, if desired, belong to the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use ai_client::{BackendError, BackendId, RiskBackend};
use scamsignal_common::{AnalysisRequest, AnalysisResult};

use crate::registry::CredentialRegistry;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no analysis backend is configured")]
    NoBackendConfigured,

    #[error("backend {0} does not support image analysis")]
    UnsupportedCapability(BackendId),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct Dispatcher {
    registry: Arc<CredentialRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CredentialRegistry>) -> Self {
        Self { registry }
    }

    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, DispatchError> {
        let state = self.registry.state().read().await;
        let (backend, adapter) = active_adapter(&state)?;
        debug!(backend = %backend, kind = %request.kind, "Dispatching analysis");
        Ok(adapter.analyze(request).await?)
    }

    /// Image analysis against the active backend. The capability is checked
    /// against the descriptor before any network round trip is attempted.
    pub async fn analyze_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<AnalysisResult, DispatchError> {
        let state = self.registry.state().read().await;
        let (backend, adapter) = active_adapter(&state)?;
        if !adapter.descriptor().supports_images {
            return Err(DispatchError::UnsupportedCapability(backend));
        }
        debug!(backend = %backend, mime_type, "Dispatching image analysis");
        Ok(adapter.analyze_image(bytes, mime_type).await?)
    }
}

fn active_adapter(
    state: &crate::registry::RegistryState,
) -> Result<(BackendId, &dyn RiskBackend), DispatchError> {
    let backend = state.active.ok_or(DispatchError::NoBackendConfigured)?;
    let adapter = state
        .adapters
        .get(&backend)
        .filter(|adapter| adapter.is_ready())
        .ok_or(DispatchError::NoBackendConfigured)?;
    Ok((backend, adapter.as_ref()))
}
