// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tool broker abstraction and the wire types it exchanges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Seconds the broker may hold one status request open while the user is
/// still busy in the browser.
pub const AUTH_STATUS_WAIT_SECS: u32 = 59;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker API key not set; provide arcade.api_key or arcade.api_key_env")]
    MissingApiKey,
    #[error("broker request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("broker error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("authorization {id} ended with status {status:?}")]
    AuthorizationFailed { id: String, status: AuthorizationStatus },
}

// ─── Tool definitions ─────────────────────────────────────────────────────────

/// One tool as described by the broker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unqualified name, e.g. `CreateIssue`.
    pub name: String,
    /// `Toolkit.Name`, e.g. `Github.CreateIssue`.
    #[serde(default)]
    pub qualified_name: String,
    /// Qualified name with version, e.g. `Github.CreateIssue@1.2.0`.
    #[serde(default)]
    pub fully_qualified_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub toolkit: ToolkitRef,
    #[serde(default)]
    pub input: ToolInput,
    #[serde(default)]
    pub requirements: Option<ToolRequirements>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolkitRef {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value_schema: ValueSchema,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueSchema {
    /// `string` | `integer` | `number` | `boolean` | `json` | `array`
    #[serde(default)]
    pub val_type: String,
    #[serde(default)]
    pub inner_val_type: Option<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolRequirements {
    /// Present when the tool needs a user authorization (OAuth grant).
    #[serde(default)]
    pub authorization: Option<Value>,
}

/// One page of the tool listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolPage {
    #[serde(default)]
    pub items: Vec<ToolDefinition>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

// ─── Authorization ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotStarted,
    Pending,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// State of one authorization flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// Token used to wait for completion.
    #[serde(default)]
    pub id: String,
    pub status: AuthorizationStatus,
    /// Browser URL the user must visit while the status is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl AuthorizationResponse {
    pub fn completed() -> Self {
        Self { id: String::new(), status: AuthorizationStatus::Completed, url: None, scopes: vec![] }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AuthorizationStatus::Completed
    }
}

// ─── Execution ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: Option<ExecuteOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteOutput {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub error: Option<ExecuteError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteError {
    #[serde(default)]
    pub message: String,
}

// ─── Traits ───────────────────────────────────────────────────────────────────

/// Remote service that lists, authorizes and executes tools on behalf of a
/// user.
#[async_trait]
pub trait ToolBroker: Send + Sync {
    /// List one page of tools, optionally restricted to one toolkit.
    async fn list_tools(
        &self,
        toolkit: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<ToolPage, BrokerError>;

    /// Fetch a single tool by qualified name.
    async fn get_tool(&self, name: &str) -> Result<ToolDefinition, BrokerError>;

    /// Start (or confirm) the authorization `user_id` needs for `tool_name`.
    async fn authorize(
        &self,
        tool_name: &str,
        user_id: &str,
    ) -> Result<AuthorizationResponse, BrokerError>;

    /// Current status of an authorization.  The broker may hold the request
    /// open for up to `wait_secs` until the status changes.
    async fn auth_status(
        &self,
        id: &str,
        wait_secs: u32,
    ) -> Result<AuthorizationResponse, BrokerError>;

    async fn execute(
        &self,
        tool_name: &str,
        input: &Value,
        user_id: &str,
    ) -> Result<ExecuteResponse, BrokerError>;
}

/// Blocks until a browser authorization is finished.
#[async_trait]
pub trait AuthWaiter: Send + Sync {
    /// Resolve with the completed authorization, or an error when the flow
    /// failed or the broker could not be reached.
    async fn wait_for_completion(&self, id: &str) -> Result<AuthorizationResponse, BrokerError>;
}

#[async_trait]
impl<B: ToolBroker + ?Sized> AuthWaiter for B {
    async fn wait_for_completion(&self, id: &str) -> Result<AuthorizationResponse, BrokerError> {
        loop {
            let resp = self.auth_status(id, AUTH_STATUS_WAIT_SECS).await?;
            debug!(auth_id = %id, status = ?resp.status, "authorization status");
            match resp.status {
                AuthorizationStatus::Completed => return Ok(resp),
                AuthorizationStatus::Pending | AuthorizationStatus::NotStarted => {}
                status => {
                    return Err(BrokerError::AuthorizationFailed { id: id.to_string(), status });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_parses_broker_shape() {
        let def: ToolDefinition = serde_json::from_str(
            r#"{
                "fully_qualified_name": "Github.CreateIssue@1.0.0",
                "qualified_name": "Github.CreateIssue",
                "name": "CreateIssue",
                "description": "Create an issue",
                "toolkit": { "name": "Github", "version": "1.0.0" },
                "input": { "parameters": [
                    { "name": "owner", "required": true, "description": "Repo owner",
                      "value_schema": { "val_type": "string", "inner_val_type": null, "enum": null } }
                ] },
                "requirements": { "authorization": { "provider_id": "github" } }
            }"#,
        )
        .unwrap();
        assert_eq!(def.qualified_name, "Github.CreateIssue");
        assert_eq!(def.toolkit.name, "Github");
        assert_eq!(def.input.parameters.len(), 1);
        assert!(def.input.parameters[0].required);
        assert!(def.requirements.and_then(|r| r.authorization).is_some());
    }

    #[test]
    fn unknown_status_does_not_fail_parsing() {
        let r: AuthorizationResponse =
            serde_json::from_str(r#"{"id":"a","status":"revoked"}"#).unwrap();
        assert_eq!(r.status, AuthorizationStatus::Unknown);
    }

    #[test]
    fn status_snake_case() {
        let r: AuthorizationResponse =
            serde_json::from_str(r#"{"id":"a","status":"not_started"}"#).unwrap();
        assert_eq!(r.status, AuthorizationStatus::NotStarted);
    }
}
