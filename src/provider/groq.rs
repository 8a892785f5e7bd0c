//! Groq backend (OpenAI-compatible).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::groq::GroqModel;
use crate::types::Message;
use crate::util::retry::RetryPolicy;

use super::openai::OpenAiBackend;
use super::{ModelBackend, ModelRequest};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqBackend {
    inner: OpenAiBackend,
}

impl GroqBackend {
    pub fn new(model: GroqModel, api_key: String, base_url: Option<String>) -> Self {
        Self {
            inner: OpenAiBackend::new(
                model.as_str().to_string(),
                api_key,
                Some(base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string())),
            )
            .with_provider_name("groq"),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(policy);
        self
    }
}

#[async_trait]
impl ModelBackend for GroqBackend {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn complete(&self, request: &ModelRequest) -> Result<Message> {
        self.inner.complete(request).await
    }
}
