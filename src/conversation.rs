//! Turns one user utterance into a reply, running any tools the model asks for.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::agent::llm::LLMProvider;
use crate::agent::session::LlmSession;
use crate::agent::types::ToolCall;
use crate::error::{ApiError, ToolError};
use crate::service::{ImageEntry, WeatherResult};
use crate::tool::{ToolOutput, ToolRegistry};

/// Appended in place of an image when the image lookup fails
pub const IMAGE_ERROR: &str = "Error getting the image.";

/// Runs conversation turns: model request, tool calls, image lookups and the final reply
pub struct ConversationHandler<P: LLMProvider> {
    session: LlmSession<P>,
    registry: ToolRegistry,
    random_image: bool,
    rng: StdRng,
}

impl<P: LLMProvider> ConversationHandler<P> {
    pub fn new(session: LlmSession<P>, registry: ToolRegistry, random_image: bool) -> Self {
        Self::with_rng(session, registry, random_image, StdRng::from_entropy())
    }

    pub fn with_rng(session: LlmSession<P>, registry: ToolRegistry, random_image: bool, rng: StdRng) -> Self {
        Self {
            session,
            registry,
            random_image,
            rng,
        }
    }

    pub fn session(&self) -> &LlmSession<P> {
        &self.session
    }

    /// Produce the reply for `user_input`.
    ///
    /// Errors only when a model request still fails after retries. Tool and
    /// image failures are folded into the reply.
    pub async fn process_input(&mut self, user_input: &str) -> Result<String, ApiError> {
        self.session.add_user_message(user_input);
        let response = self.session.request_with_tools().await?;

        let tool_calls = response.requested_tool_calls().to_vec();
        if tool_calls.is_empty() {
            let content = response.content.unwrap_or_default();
            self.session.add_assistant_message(&content);
            return Ok(content);
        }

        info!("Model requested {} tool calls", tool_calls.len());
        // Tool results must follow the message that requested them
        self.session.add_assistant_response(response);

        let mut images = Vec::new();
        for (i, call) in tool_calls.iter().enumerate() {
            let output = match self
                .registry
                .dispatch(&call.function.name, &call.function.arguments)
                .await
            {
                Ok(output) => output,
                Err(e) => {
                    warn!("Tool call {} failed: {}", call.function.name, e);
                    self.close_abandoned_calls(&e, call, &tool_calls[i + 1..]);
                    return self.narrate_tool_error(call).await;
                }
            };

            self.session.add_tool_result(call, &output.payload());
            if let ToolOutput::Weather(weather) = &output {
                images.push(self.image_for_weather(weather).await);
            }
        }

        let response = self.session.request_with_tools().await?;
        if !response.requested_tool_calls().is_empty() {
            warn!("Ignoring tool calls requested in the final response");
        }
        let mut content = response.content.unwrap_or_default();
        self.session.add_assistant_message(&content);

        for url in images {
            content.push_str(&format!("\n {}", url));
        }
        Ok(content)
    }

    /// Record results for the failed call and every call after it so the
    /// history stays valid for the next turn. None of them are executed.
    fn close_abandoned_calls(&mut self, err: &ToolError, failed: &ToolCall, skipped: &[ToolCall]) {
        let payload = json!({ "error": err.to_string() }).to_string();
        self.session.add_tool_result(failed, &payload);

        let payload = json!({ "error": "skipped after an earlier tool failure" }).to_string();
        for call in skipped {
            debug!("Skipping tool call {}", call.function.name);
            self.session.add_tool_result(call, &payload);
        }
    }

    async fn narrate_tool_error(&mut self, call: &ToolCall) -> Result<String, ApiError> {
        let prompt = format!(
            "Couldn't get the weather for that location using {}.",
            call.function.name
        );
        let response = self.session.request_plain(&prompt).await?;
        let content = response.content.unwrap_or_default();
        self.session.add_assistant_message(&content);
        Ok(content)
    }

    async fn image_for_weather(&mut self, weather: &WeatherResult) -> String {
        let query = image_query(weather);
        match self.registry.search_images(&query).await {
            Ok(result) => select_image(&result.images, self.random_image, &mut self.rng)
                .map(|image| image.url().to_string())
                .unwrap_or_else(|| IMAGE_ERROR.to_string()),
            Err(e) => {
                warn!("Image lookup for '{}' failed: {}", query, e);
                IMAGE_ERROR.to_string()
            }
        }
    }
}

pub fn image_query(weather: &WeatherResult) -> String {
    format!(
        "{} in {}, {}",
        weather.description, weather.location, weather.country_code
    )
}

/// Uniformly random entry when `random` is set, otherwise the first
pub fn select_image<'a, R: Rng>(images: &'a [ImageEntry], random: bool, rng: &mut R) -> Option<&'a ImageEntry> {
    if random {
        images.choose(rng)
    } else {
        images.first()
    }
}
