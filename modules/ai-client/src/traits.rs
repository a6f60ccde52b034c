use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use scamsignal_common::{AnalysisRequest, AnalysisResult};

use crate::error::BackendError;

// =============================================================================
// Backend Identity
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    Claude,
    OpenAi,
    OpenRouter,
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendId::Claude => write!(f, "claude"),
            BackendId::OpenAi => write!(f, "openai"),
            BackendId::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl std::str::FromStr for BackendId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(BackendId::Claude),
            "openai" => Ok(BackendId::OpenAi),
            "openrouter" => Ok(BackendId::OpenRouter),
            other => Err(anyhow::anyhow!("unknown backend id: {other}")),
        }
    }
}

impl BackendId {
    pub const ALL: [BackendId; 3] = [BackendId::Claude, BackendId::OpenAi, BackendId::OpenRouter];

    pub fn descriptor(self) -> &'static BackendDescriptor {
        match self {
            BackendId::Claude => &CLAUDE_DESCRIPTOR,
            BackendId::OpenAi => &OPENAI_DESCRIPTOR,
            BackendId::OpenRouter => &OPENROUTER_DESCRIPTOR,
        }
    }
}

// =============================================================================
// Backend Descriptor
// =============================================================================

/// Static per-backend metadata. One per supported backend kind.
#[derive(Debug, Clone, Copy)]
pub struct BackendDescriptor {
    pub id: BackendId,
    pub name: &'static str,
    pub requires_credential: bool,
    pub supports_images: bool,
}

pub static CLAUDE_DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    id: BackendId::Claude,
    name: "Anthropic Claude",
    requires_credential: true,
    supports_images: true,
};

pub static OPENAI_DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    id: BackendId::OpenAi,
    name: "OpenAI",
    requires_credential: true,
    supports_images: true,
};

// OpenRouter proxies heterogeneous models, so image input cannot be assumed.
pub static OPENROUTER_DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    id: BackendId::OpenRouter,
    name: "OpenRouter",
    requires_credential: true,
    supports_images: false,
};

// =============================================================================
// RiskBackend Trait
// =============================================================================

/// One external analysis backend. Adapters are stateless per call apart from
/// the ready flag set by `initialize()`; their only side effect is network I/O.
#[async_trait]
pub trait RiskBackend: Send + Sync {
    fn descriptor(&self) -> &'static BackendDescriptor;

    /// Cheap, local, syntactic validation of the credential shape. Sets the
    /// ready flag on success. Never touches the network: the registry uses
    /// this to reject obviously malformed credentials without latency or
    /// quota cost.
    fn initialize(&mut self) -> bool;

    fn is_ready(&self) -> bool;

    /// Run one analysis call and normalize the raw reply.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError>;

    /// Image analysis, for backends whose descriptor declares image support.
    async fn analyze_image(
        &self,
        _bytes: &[u8],
        _mime_type: &str,
    ) -> Result<AnalysisResult, BackendError> {
        Err(BackendError::ImageUnsupported {
            backend: self.descriptor().id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn backend_id_round_trips_through_str() {
        for id in BackendId::ALL {
            assert_eq!(BackendId::from_str(&id.to_string()).unwrap(), id);
        }
        assert!(BackendId::from_str("bard").is_err());
    }

    #[test]
    fn descriptors_declare_expected_capabilities() {
        assert!(BackendId::Claude.descriptor().supports_images);
        assert!(BackendId::OpenAi.descriptor().supports_images);
        assert!(!BackendId::OpenRouter.descriptor().supports_images);
        for id in BackendId::ALL {
            assert!(id.descriptor().requires_credential);
            assert_eq!(id.descriptor().id, id);
        }
    }
}
