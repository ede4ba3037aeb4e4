pub mod openai;

use super::types::{Message, Tool};
use crate::error::ApiError;

/// Chat-completion backend.
///
/// `tools` is `None` for plain requests; when present the model is left to
/// pick tools on its own.
pub trait LLMProvider {
    async fn call(&self, messages: &[Message], tools: Option<&[Tool]>) -> Result<Message, ApiError>;
}
