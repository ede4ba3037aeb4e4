use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use tracing::debug;

use crate::retry::RetryPolicy;

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct ImageConfig {
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Pick a random image from the search results instead of the first
    #[serde(default = "default_random_image")]
    pub random_image: bool,
    /// Inputs that end the conversation, compared case-insensitively
    #[serde(default = "default_exit_phrases")]
    pub exit_phrases: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            random_image: default_random_image(),
            exit_phrases: default_exit_phrases(),
        }
    }
}

impl ChatConfig {
    pub fn is_exit_phrase(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_phrases
            .iter()
            .any(|phrase| phrase.eq_ignore_ascii_case(input))
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".into()
}

fn default_image_base_url() -> String {
    "https://api.bing.microsoft.com/v7.0".into()
}

fn default_random_image() -> bool {
    true
}

fn default_exit_phrases() -> Vec<String> {
    vec!["exit".into(), "quit".into(), "stop".into()]
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Config file {} not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path)),
        };
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
