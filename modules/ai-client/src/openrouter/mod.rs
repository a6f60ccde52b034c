mod client;

use std::time::Duration;

use async_trait::async_trait;

use scamsignal_common::{AnalysisRequest, AnalysisResult};

use crate::error::BackendError;
use crate::normalize::normalize;
use crate::openai::types::{ChatMessage, ChatRequest};
use crate::prompt::{analysis_user_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::traits::{BackendDescriptor, BackendId, RiskBackend};

use client::OpenRouterClient;

/// OpenRouter adapter. Speaks the OpenAI chat-completions wire shape against
/// the OpenRouter proxy. Text-only: the proxied model is not known to accept
/// image input, so the descriptor does not claim the capability.
pub struct OpenRouterBackend {
    api_key: String,
    model: String,
    language: String,
    timeout: Duration,
    ready: bool,
}

impl OpenRouterBackend {
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
}

#[async_trait]
impl RiskBackend for OpenRouterBackend {
    fn descriptor(&self) -> &'static BackendDescriptor {
        BackendId::OpenRouter.descriptor()
    }

    fn initialize(&mut self) -> bool {
        self.ready = self.api_key.starts_with("sk-or-") && self.api_key.len() > 20;
        self.ready
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        let chat = ChatRequest::new(&self.model)
            .message(ChatMessage::system(ANALYSIS_SYSTEM_PROMPT))
            .message(ChatMessage::user(analysis_user_prompt(
                request,
                &self.language,
            )))
            .temperature(0.0);
        let client = OpenRouterClient::new(&self.api_key, self.timeout);
        let response = client.chat(&chat).await?;
        let text = response.text().ok_or(BackendError::EmptyReply {
            backend: BackendId::OpenRouter,
        })?;
        Ok(normalize(&text))
    }

    // analyze_image: trait default, the descriptor declares no image support.
}
