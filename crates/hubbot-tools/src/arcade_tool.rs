// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::broker::{AuthorizationResponse, BrokerError, ToolBroker};
use crate::descriptor::ToolDescriptor;
use crate::policy::ApprovalPolicy;
use crate::tool::{Tool, ToolCall, ToolOutput};

/// A provisioned tool that runs remotely through the broker.
pub struct ArcadeTool {
    descriptor: ToolDescriptor,
    broker: Arc<dyn ToolBroker>,
    user_id: String,
    policy: ApprovalPolicy,
}

impl ArcadeTool {
    pub fn new(
        descriptor: ToolDescriptor,
        broker: Arc<dyn ToolBroker>,
        user_id: impl Into<String>,
        policy: ApprovalPolicy,
    ) -> Self {
        Self { descriptor, broker, user_id: user_id.into(), policy }
    }
}

#[async_trait]
impl Tool for ArcadeTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters_schema(&self) -> Value {
        self.descriptor.parameters.clone()
    }

    fn default_policy(&self) -> ApprovalPolicy {
        self.policy
    }

    fn requires_auth(&self) -> bool {
        self.descriptor.requires_auth
    }

    async fn authorize(&self) -> Result<AuthorizationResponse, BrokerError> {
        if !self.descriptor.requires_auth {
            return Ok(AuthorizationResponse::completed());
        }
        self.broker.authorize(&self.descriptor.qualified_name, &self.user_id).await
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let resp = match self
            .broker
            .execute(&self.descriptor.qualified_name, &call.args, &self.user_id)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(tool = %self.descriptor.name, "tool execution failed: {e}");
                return ToolOutput::err(&call.id, format!("tool execution failed: {e}"));
            }
        };

        let output = resp.output.unwrap_or_default();
        if let Some(err) = output.error.filter(|e| !e.message.is_empty()) {
            return ToolOutput::err(&call.id, err.message);
        }
        if !resp.success {
            return ToolOutput::err(&call.id, "tool execution was not successful");
        }
        let content = match output.value {
            Some(Value::String(s)) => s,
            Some(v) => v.to_string(),
            None => String::new(),
        };
        ToolOutput::ok(&call.id, content)
    }
}
