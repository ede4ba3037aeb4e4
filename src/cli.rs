use clap::Parser;

// Display order for API key options (placed at top of help text)
const API_KEY_DISPLAY_ORDER: usize = 0;
// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "weatherbot", version, about = "Chatbot that answers weather questions", long_about = None)]
pub struct Cli {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, display_order = API_KEY_DISPLAY_ORDER)]
    pub openai_api_key: Option<String>,

    /// OpenWeather API key
    #[arg(long, env = "OPEN_WEATHER_API_KEY", hide_env_values = true, display_order = API_KEY_DISPLAY_ORDER)]
    pub weather_api_key: Option<String>,

    /// Bing Image Search API key
    #[arg(long, env = "BING_API_KEY", hide_env_values = true, display_order = API_KEY_DISPLAY_ORDER)]
    pub bing_api_key: Option<String>,

    /// Path to config file (optional, defaults apply when missing)
    #[arg(long, default_value = "weatherbot.toml")]
    pub config: String,

    /// Override the chat model from the config file (e.g. gpt-4o-mini)
    #[arg(long)]
    pub model: Option<String>,

    /// Always attach the first image result instead of a random one
    #[arg(long)]
    pub no_random_image: bool,

    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: WEATHERBOT_LOG=] [default: info]
    #[arg(
        long,
        env = "WEATHERBOT_LOG",
        default_value = "info",
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,
}
