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

use client::OpenAiClient;
use types::{ChatMessage, ChatRequest};

/// OpenAI adapter. Supports text and image analysis.
pub struct OpenAiBackend {
    api_key: String,
    model: String,
    language: String,
    timeout: Duration,
    ready: bool,
}

impl OpenAiBackend {
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

    fn client(&self) -> OpenAiClient {
        OpenAiClient::new(&self.api_key, self.timeout)
    }

    async fn run(&self, request: ChatRequest) -> Result<AnalysisResult, BackendError> {
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        let response = self.client().chat(&request).await?;
        let text = response.text().ok_or(BackendError::EmptyReply {
            backend: BackendId::OpenAi,
        })?;
        Ok(normalize(&text))
    }
}

#[async_trait]
impl RiskBackend for OpenAiBackend {
    fn descriptor(&self) -> &'static BackendDescriptor {
        BackendId::OpenAi.descriptor()
    }

    fn initialize(&mut self) -> bool {
        // Plain OpenAI keys only: "sk-ant-"/"sk-or-" shaped secrets belong
        // to the other adapters and would fail auth here.
        self.ready = self.api_key.starts_with("sk-")
            && !self.api_key.starts_with("sk-ant-")
            && !self.api_key.starts_with("sk-or-")
            && self.api_key.len() > 20;
        self.ready
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let chat = ChatRequest::new(&self.model)
            .message(ChatMessage::system(ANALYSIS_SYSTEM_PROMPT))
            .message(ChatMessage::user(analysis_user_prompt(
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
        let data_url = format!("data:{mime_type};base64,{encoded}");
        let chat = ChatRequest::new(&self.model)
            .message(ChatMessage::system(ANALYSIS_SYSTEM_PROMPT))
            .message(ChatMessage::user_with_image(
                data_url,
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
    fn initialize_accepts_openai_shaped_keys() {
        let mut backend = OpenAiBackend::new("sk-proj-abcdefghijklmnopqrs", "gpt-test");
        assert!(backend.initialize());
    }

    #[test]
    fn initialize_rejects_foreign_and_malformed_keys() {
        for key in [
            "sk-ant-REDACTED",
            "sk-or-v1-abcdefghijklmnopqrs",
            "sk-short",
            "pk-abcdefghijklmnopqrstuvw",
        ] {
            let mut backend = OpenAiBackend::new(key, "gpt-test");
            assert!(!backend.initialize(), "accepted {key:?}");
        }
    }
}
