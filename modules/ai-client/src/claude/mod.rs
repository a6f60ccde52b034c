mod client;
pub(crate) mod types;

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;

use scamsignal_common::{AnalysisRequest, AnalysisResult};

use crate::error::BackendError;
use crate::normalize::normalize;
use crate::prompt::{analysis_user_prompt, image_user_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::traits::{BackendDescriptor, BackendId, RiskBackend};

use client::ClaudeClient;
use types::{ChatRequest, ImageSource, WireMessage};

/// Anthropic Claude adapter. Supports text and image analysis.
pub struct ClaudeBackend {
    api_key: String,
    model: String,
    language: String,
    timeout: Duration,
    ready: bool,
}

impl ClaudeBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            language: "en".to_string(),
            timeout: Duration::from_secs(30),
            ready: false,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn client(&self) -> ClaudeClient {
        ClaudeClient::new(&self.api_key, self.timeout)
    }

    async fn run(&self, request: ChatRequest) -> Result<AnalysisResult, BackendError> {
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        let response = self.client().chat(&request).await?;
        let text = response.text().ok_or(BackendError::EmptyReply {
            backend: BackendId::Claude,
        })?;
        Ok(normalize(&text))
    }
}

#[async_trait]
impl RiskBackend for ClaudeBackend {
    fn descriptor(&self) -> &'static BackendDescriptor {
        BackendId::Claude.descriptor()
    }

    fn initialize(&mut self) -> bool {
        self.ready = self.api_key.starts_with("sk-ant-") && self.api_key.len() > 20;
        self.ready
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let chat = ChatRequest::new(&self.model)
            .system(ANALYSIS_SYSTEM_PROMPT)
            .message(WireMessage::user(analysis_user_prompt(
                request,
                &self.language,
            )))
            .temperature(0.0);
        self.run(chat).await
    }

    async fn analyze_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<AnalysisResult, BackendError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let source = ImageSource {
            source_type: "base64".to_string(),
            media_type: mime_type.to_string(),
            data: encoded,
        };
        let chat = ChatRequest::new(&self.model)
            .system(ANALYSIS_SYSTEM_PROMPT)
            .message(WireMessage::user_with_image(
                source,
                image_user_prompt(&self.language),
            ))
            .temperature(0.0);
        self.run(chat).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_accepts_anthropic_shaped_keys() {
        let mut backend = ClaudeBackend::new("sk-ant-REDACTED", "claude-test");
        assert!(backend.initialize());
        assert!(backend.is_ready());
    }

    #[test]
    fn initialize_rejects_malformed_keys() {
        for key in ["", "sk-ant-", "sk-abcdefghijklmnopqrstu", "not-a-key"] {
            let mut backend = ClaudeBackend::new(key, "claude-test");
            assert!(!backend.initialize(), "accepted {key:?}");
            assert!(!backend.is_ready());
        }
    }

    #[tokio::test]
    async fn analyze_before_initialize_fails_without_network() {
        let backend = ClaudeBackend::new("sk-ant-REDACTED", "claude-test");
        let request = AnalysisRequest {
            query: "x".into(),
            kind: scamsignal_common::IdentifierKind::Text,
            prior_report_count: 0,
            context: String::new(),
        };
        assert!(matches!(
            backend.analyze(&request).await,
            Err(BackendError::NotReady)
        ));
    }
}
