use serde::{Deserialize, Serialize};
use tracing::trace;

use super::LLMProvider;
use crate::agent::types::{Message, Tool};
use crate::error::ApiError;

const SERVICE: &str = "chat completion";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

/// OpenAI-compatible LLM provider
pub struct OpenAIProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

impl LLMProvider for OpenAIProvider {
    async fn call(&self, messages: &[Message], tools: Option<&[Tool]>) -> Result<Message, ApiError> {
        trace!(
            "Request: {} messages, {} tools",
            messages.len(),
            tools.map_or(0, |t| t.len())
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
            tool_choice: tools.map(|_| "auto"),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                service: SERVICE,
                status,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ApiError::decode(SERVICE, e.without_url()))?;
        trace!("Response has {} choices", chat_response.choices.len());

        // First choice is the primary response
        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ApiError::decode(SERVICE, "response has no choices"))
    }
}
