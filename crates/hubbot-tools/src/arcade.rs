// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! HTTP client for the Arcade tool broker.

use async_trait::async_trait;
use hubbot_config::ArcadeConfig;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::broker::{
    AuthorizationResponse, BrokerError, ExecuteResponse, ToolBroker, ToolDefinition, ToolPage,
};

pub struct ArcadeClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ArcadeClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(cfg: &ArcadeConfig) -> Self {
        let key = cfg
            .api_key
            .clone()
            .or_else(|| cfg.api_key_env.as_deref().and_then(|env| std::env::var(env).ok()));
        Self::new(cfg.base_url.clone(), key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, BrokerError> {
        let key = self.api_key.as_deref().ok_or(BrokerError::MissingApiKey)?;
        let resp = req.bearer_auth(key).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Status { status: status.as_u16(), body });
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl ToolBroker for ArcadeClient {
    async fn list_tools(
        &self,
        toolkit: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<ToolPage, BrokerError> {
        debug!(?toolkit, limit, offset, "listing tools");
        let mut query: Vec<(&str, String)> =
            vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(tk) = toolkit {
            query.push(("toolkit", tk.to_string()));
        }
        self.send(self.client.get(self.url("/v1/tools")).query(&query)).await
    }

    async fn get_tool(&self, name: &str) -> Result<ToolDefinition, BrokerError> {
        debug!(tool = %name, "fetching tool");
        self.send(self.client.get(self.url(&format!("/v1/tools/{name}")))).await
    }

    async fn authorize(
        &self,
        tool_name: &str,
        user_id: &str,
    ) -> Result<AuthorizationResponse, BrokerError> {
        debug!(tool = %tool_name, "authorizing tool");
        let body = json!({ "tool_name": tool_name, "user_id": user_id });
        self.send(self.client.post(self.url("/v1/tools/authorize")).json(&body)).await
    }

    async fn auth_status(
        &self,
        id: &str,
        wait_secs: u32,
    ) -> Result<AuthorizationResponse, BrokerError> {
        let query = [("id", id.to_string()), ("wait", wait_secs.to_string())];
        self.send(self.client.get(self.url("/v1/auth/status")).query(&query)).await
    }

    async fn execute(
        &self,
        tool_name: &str,
        input: &Value,
        user_id: &str,
    ) -> Result<ExecuteResponse, BrokerError> {
        debug!(tool = %tool_name, "executing tool");
        let body = json!({ "tool_name": tool_name, "input": input, "user_id": user_id });
        self.send(self.client.post(self.url("/v1/tools/execute")).json(&body)).await
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
