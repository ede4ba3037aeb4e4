use tracing::{debug, trace};

use super::llm::LLMProvider;
use super::types::{Message, Role, Tool, ToolCall};
use crate::error::ApiError;
use crate::retry::{RetryPolicy, with_retry};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for a user who wants to know the weather. \
You can provide the current weather in a location and an image.";

/// Conversation history plus the provider it is sent to.
///
/// History is append-only and always starts with [`SYSTEM_PROMPT`].
pub struct LlmSession<P: LLMProvider> {
    provider: P,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    retry: RetryPolicy,
}

impl<P: LLMProvider> LlmSession<P> {
    pub fn new(provider: P, tools: Vec<Tool>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            messages: vec![Message::system(SYSTEM_PROMPT)],
            tools,
            retry,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn add_user_message(&mut self, content: &str) {
        self.push(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: &str) {
        self.push(Message::assistant(content));
    }

    /// Append a model response as-is so its tool calls stay referenceable
    pub fn add_assistant_response(&mut self, response: Message) {
        debug_assert_eq!(response.role, Role::Assistant);
        self.push(response);
    }

    /// Append the result of `call`. `payload` is the serialized tool output.
    pub fn add_tool_result(&mut self, call: &ToolCall, payload: &str) {
        debug_assert!(
            self.pending_call_ids().any(|id| id == call.id),
            "tool result for unknown call {}",
            call.id
        );
        self.push(Message::tool_result(&call.id, &call.function.name, payload));
    }

    /// Ask the model for the next message with the tool catalogue attached
    pub async fn request_with_tools(&self) -> Result<Message, ApiError> {
        debug!("Requesting completion with {} tools", self.tools.len());
        with_retry(&self.retry, ApiError::is_transient, || {
            self.provider.call(&self.messages, Some(self.tools.as_slice()))
        })
        .await
    }

    /// Completion over the full history without tools. `instruction` is sent
    /// as a trailing system message but never stored in the history.
    pub async fn request_plain(&self, instruction: &str) -> Result<Message, ApiError> {
        let mut messages = self.messages.clone();
        messages.push(Message::system(instruction));
        debug!("Requesting plain completion over {} messages", messages.len());
        with_retry(&self.retry, ApiError::is_transient, || self.provider.call(&messages, None)).await
    }

    fn push(&mut self, message: Message) {
        trace!(
            "Adding message: role={:?}, content_len={}",
            message.role,
            message.content.as_deref().map_or(0, str::len)
        );
        self.messages.push(message);
    }

    /// Tool call ids of the latest assistant message
    fn pending_call_ids(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.requested_tool_calls())
            .unwrap_or_default()
            .iter()
            .map(|call| call.id.as_str())
    }
}
