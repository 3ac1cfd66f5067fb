// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use hubbot_chat::{ChatSession, InterruptResolver, Prepared, StdConsole};
use hubbot_core::{Agent, MemoryCheckpointer};
use hubbot_tools::{ArcadeClient, Tool, ToolRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let config = hubbot_config::load(cli.config.as_deref())?;

    if let Some(Commands::ShowConfig) = &cli.command {
        println!("{}", serde_yaml::to_string(&config.redacted()).unwrap_or_default());
        return Ok(());
    }

    // Both identities must be known before any client exists.
    let Prepared { config, broker: arcade, registry } = hubbot_chat::prepare(
        config,
        |key| std::env::var(key).ok(),
        |cfg| Arc::new(ArcadeClient::from_config(cfg)),
    )
    .await?;

    if let Some(Commands::ListTools) = &cli.command {
        list_tools(&registry);
        return Ok(());
    }

    let model = hubbot_model::from_config(&config.model)
        .context("failed to initialise model provider")?;
    let model: Arc<dyn hubbot_model::ModelProvider> = Arc::from(model);
    info!(model = %model.model_name(), tools = registry.len(), "starting chat");

    let agent = Agent::new(
        model,
        Arc::new(registry),
        Arc::new(config.agent.clone()),
        Arc::new(MemoryCheckpointer::new()),
    );
    let resolver = InterruptResolver::from_config(arcade, &config.agent);
    let session = ChatSession::new(Arc::new(agent), resolver, config.agent.thread_id.clone());

    session.run(&mut StdConsole::new()).await
}

fn list_tools(registry: &ToolRegistry) {
    for name in registry.names() {
        let Some(tool) = registry.get(&name) else { continue };
        let summary = tool.description().lines().next().unwrap_or_default();
        let auth = if tool.requires_auth() { "auth" } else { "-" };
        let policy = format!("{:?}", tool.default_policy()).to_lowercase();
        println!("{name:40} {auth:4} {policy:4} {summary}");
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
