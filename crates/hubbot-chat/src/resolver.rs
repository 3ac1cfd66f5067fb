// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::Value;
use tracing::{info, warn};

use hubbot_config::AgentConfig;
use hubbot_core::{Decision, PauseEvent};
use hubbot_tools::{AuthWaiter, AuthorizationResponse};

use crate::console::Console;

const GEAR: &str = "⚙️";

pub const APPROVAL_QUESTION: &str = "Do you approve this tool call? (yes/no) ";

/// Turns each pause into a yes/no by asking the user.  Fails closed: any
/// error or unexpected pause is a denial.
pub struct InterruptResolver {
    waiter: Arc<dyn AuthWaiter>,
    auth_timeout: Option<Duration>,
}

impl InterruptResolver {
    pub fn new(waiter: Arc<dyn AuthWaiter>, auth_timeout: Option<Duration>) -> Self {
        Self { waiter, auth_timeout }
    }

    /// `auth_timeout_secs = 0` waits for as long as the broker does.
    pub fn from_config(waiter: Arc<dyn AuthWaiter>, cfg: &AgentConfig) -> Self {
        let timeout = (cfg.auth_timeout_secs > 0).then(|| Duration::from_secs(cfg.auth_timeout_secs));
        Self::new(waiter, timeout)
    }

    /// Only a console read failure is returned as an error.
    pub async fn resolve(
        &self,
        event: &PauseEvent,
        console: &mut dyn Console,
    ) -> anyhow::Result<Decision> {
        match event {
            PauseEvent::Authorization { tool_name, authorization } => {
                Ok(self.authorize(tool_name, authorization, console).await)
            }
            PauseEvent::Approval { tool_name, input } => approve(tool_name, input, console).await,
            PauseEvent::Unknown => {
                warn!("unrecognised interrupt; denying");
                Ok(Decision::denied())
            }
        }
    }

    async fn authorize(
        &self,
        tool_name: &str,
        authorization: &AuthorizationResponse,
        console: &mut dyn Console,
    ) -> Decision {
        console.say(&format!("{GEAR}: Authorization required for tool call {tool_name}"));
        let url = authorization.url.as_deref().unwrap_or("(no URL provided)");
        console.say(&format!("{GEAR}: Please authorize in your browser {url}"));
        console.say(&format!("{GEAR}: Waiting for you to complete authorization..."));

        match self.wait(&authorization.id).await {
            Ok(resp) if resp.is_completed() => {
                info!(tool = %tool_name, "authorization granted");
                console.say(&format!("{GEAR}: Authorization granted. Resuming execution..."));
                Decision::granted()
            }
            Ok(resp) => {
                warn!(tool = %tool_name, status = ?resp.status, "authorization did not complete");
                console.warn(&format!(
                    "{GEAR}: Error waiting for authorization to complete: status {:?}",
                    resp.status
                ));
                Decision::denied()
            }
            Err(e) => {
                warn!(tool = %tool_name, "authorization wait failed: {e:#}");
                console.warn(&format!(
                    "{GEAR}: Error waiting for authorization to complete: {e:#}"
                ));
                Decision::denied()
            }
        }
    }

    async fn wait(&self, id: &str) -> anyhow::Result<AuthorizationResponse> {
        let wait = self.waiter.wait_for_completion(id);
        match self.auth_timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(res) => Ok(res?),
                Err(_) => Err(anyhow!("no response within {limit:?}")),
            },
            None => Ok(wait.await?),
        }
    }
}

async fn approve(
    tool_name: &str,
    input: &Value,
    console: &mut dyn Console,
) -> anyhow::Result<Decision> {
    console.say(&format!("{GEAR}: Human in the loop required for tool call {tool_name}"));
    let pretty = serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string());
    console.say(&format!("{GEAR}: Please approve the tool call {pretty}"));

    let answer = console.read_line(APPROVAL_QUESTION).await?;
    let approved = answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("yes"));
    info!(tool = %tool_name, approved, "approval answered");
    Ok(Decision { authorized: approved })
}
