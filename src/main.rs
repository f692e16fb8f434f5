mod agent;
mod assemble;
mod cli;
mod config;
mod llm;
mod router;
mod server;
mod sources;
mod tools;
mod types;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, Level};

use agent::{Agent, RunGuard};
use cli::{Cli, Commands};
use config::AppConfig;
use llm::LlmProvider;
use llm::openai_compatible::OpenAiCompatibleProvider;
use router::PlanRouter;
use server::AppState;
use sources::newsapi::NewsApi;
use sources::open_meteo::OpenMeteo;
use sources::wikipedia::Wikipedia;
use tools::{NewsTool, ToolRouter, WeatherTool, WikiTool};

/// Create the LLM provider based on config.
fn create_llm_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = config.api_key()?;
    let api_base = config.llm.api_base.clone();

    match config.llm.provider.as_str() {
        "openai_compatible" | "openai" => {
            Ok(Arc::new(OpenAiCompatibleProvider::new(api_key, api_base)))
        }
        other => {
            bail!(
                "Unknown provider: '{}'. Supported: 'openai_compatible'",
                other
            )
        }
    }
}

fn build_tools(config: &AppConfig) -> ToolRouter {
    // One Open-Meteo client serves both geocoding and forecasts.
    let open_meteo = Arc::new(OpenMeteo::new());
    let weather = WeatherTool::new(open_meteo.clone(), open_meteo);
    let news = NewsTool::new(
        Arc::new(NewsApi::new(config.news_api_key())),
        config.news.freshness_days,
    );
    let wiki = WikiTool::new(Arc::new(Wikipedia::new()));
    ToolRouter::new(weather, news, wiki)
}

async fn serve(
    bind: &str,
    guard: Arc<RunGuard>,
    tools: Arc<ToolRouter>,
    model: String,
) -> Result<()> {
    let state = AppState::new(guard.clone(), tools, model);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    server::start_server(bind, state, shutdown_rx).await?;
    guard.teardown().await;
    info!("shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .init();

    // Auto-generate config file on first run (default location only).
    if cli.config.is_none() {
        let config_path = AppConfig::config_path()?;
        if !config_path.exists() {
            let path = AppConfig::save_default()?;
            info!("Created default config: {}", path.display());
            info!("Edit it to set your api_key, model, etc.");
        }
    }

    let config = AppConfig::load_with(cli.config.as_deref())?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "configuration loaded"
    );

    let provider = create_llm_provider(&config)?;
    let tools = Arc::new(build_tools(&config));
    let plan_router = PlanRouter::new(
        provider,
        config.llm.model.clone(),
        config.router.max_depth,
        config.llm.max_tokens,
    );
    let agent = Arc::new(Agent::new(plan_router, tools.clone()));
    let model = agent.model().to_string();

    let guard = Arc::new(RunGuard::new());
    guard.install(agent).await;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Ask { question } => {
            cli::run_ask(&guard, &question).await?;
            guard.teardown().await;
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            serve(&bind, guard, tools, model).await?;
        }
    }

    Ok(())
}
