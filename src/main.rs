mod agent;
mod cli;
mod config;
mod console;
mod conversation;
mod error;
mod retry;
mod service;
mod tool;

use agent::llm::openai::OpenAIProvider;
use agent::session::LlmSession;
use clap::Parser;
use cli::Cli;
use config::Config;
use conversation::ConversationHandler;
use tool::ToolRegistry;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(&cli.config)?;
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if cli.no_random_image {
        config.chat.random_image = false;
    }
    debug!("base_url: {}, model: {}", config.llm.base_url, config.llm.model);

    let registry = ToolRegistry::from_config(&config, cli.weather_api_key, cli.bing_api_key)?;
    let Some(openai_api_key) = cli.openai_api_key.filter(|k| !k.is_empty()) else {
        anyhow::bail!("OpenAI API key is required. Use --openai-api-key or set OPENAI_API_KEY");
    };

    let provider = OpenAIProvider::new(config.llm.base_url.clone(), openai_api_key, config.llm.model.clone());
    let session = LlmSession::new(provider, ToolRegistry::advertised_specs(), config.retry.clone());
    let mut handler = ConversationHandler::new(session, registry, config.chat.random_image);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console::run(&mut handler, &config.chat, stdin, &mut std::io::stdout()).await
}
