// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use hubbot_config::{ArcadeConfig, Config};
use hubbot_tools::{provision, ProvisionRequest, ToolBroker, ToolPolicy, ToolRegistry};

/// Everything the chat needs from the broker side, ready to use.
pub struct Prepared<B> {
    pub config: Config,
    pub broker: Arc<B>,
    pub registry: ToolRegistry,
}

/// Apply the required environment values, then connect to the broker and
/// provision the tool catalog.
///
/// `connect` is only called once `lookup` has produced every required value,
/// so a missing variable fails before any network traffic.
pub async fn prepare<B, L, C>(mut config: Config, lookup: L, connect: C) -> anyhow::Result<Prepared<B>>
where
    B: ToolBroker + 'static,
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&ArcadeConfig) -> Arc<B>,
{
    config.apply_env_with(lookup)?;

    let broker = connect(&config.arcade);
    let request = ProvisionRequest::from_config(&config.arcade);
    let catalog = provision(broker.as_ref(), &request)
        .await
        .context("failed to provision tools")?;
    debug!(tools = catalog.len(), "tool catalog provisioned");

    let policy = ToolPolicy::from_config(&config.tools);
    let registry = ToolRegistry::from_catalog(
        catalog,
        Arc::clone(&broker) as Arc<dyn ToolBroker>,
        &config.arcade.user_id,
        &policy,
    );
    Ok(Prepared { config, broker, registry })
}
