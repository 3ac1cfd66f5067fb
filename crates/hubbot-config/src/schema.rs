// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::prompt::DEFAULT_SYSTEM_PROMPT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub arcade: ArcadeConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

const REDACTED: &str = "****";

impl Config {
    /// A copy safe to print: explicit API keys are masked.
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();
        if cfg.model.api_key.is_some() {
            cfg.model.api_key = Some(REDACTED.into());
        }
        if cfg.arcade.api_key.is_some() {
            cfg.arcade.api_key = Some(REDACTED.into());
        }
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider identifier: "openai" | "mock"
    pub provider: String,
    /// Model name forwarded to the provider API.  Filled from `OPENAI_MODEL`
    /// at startup.
    pub name: String,
    /// Environment variable that holds the API key (read at runtime)
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer api_key_env in config files to avoid secrets
    /// in version-controlled files
    pub api_key: Option<String>,
    /// Base URL override for proxies or OpenAI-compatible gateways.
    pub base_url: Option<String>,
    /// Maximum tokens to request in a single completion
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0–2.0)
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            name: String::new(),
            api_key_env: Some("OPENAI_API_KEY".into()),
            api_key: None,
            base_url: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Connection to the Arcade tool broker and the tool catalog to request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub base_url: String,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    /// Identity that authorizes each service.  Filled from `ARCADE_USER_ID`
    /// at startup.
    pub user_id: String,
    /// Toolkits whose tools are all provisioned, e.g. `["Github"]`.
    pub toolkits: Vec<String>,
    /// Individually named tools provisioned in addition to the toolkits.
    pub tools: Vec<String>,
    /// Maximum number of tool definitions requested from the broker.
    pub tool_limit: usize,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.arcade.dev".into(),
            api_key_env: Some("ARCADE_API_KEY".into()),
            api_key: None,
            user_id: String::new(),
            toolkits: vec!["Github".into()],
            tools: vec![],
            tool_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Conversation thread that every turn of this process is stored under.
    pub thread_id: String,
    /// Maximum model ↔ tool rounds within one turn
    pub max_tool_rounds: u32,
    /// Upper bound on waiting for a browser authorization, in seconds.
    /// `0` waits until the broker reports a final status.
    pub auth_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            thread_id: "1".into(),
            max_tool_rounds: 50,
            auth_timeout_secs: 0,
        }
    }
}

/// Which tool calls pause for a yes/no from the user, and which never run.
///
/// Patterns are globs over the model-facing tool name (`Github_CreateIssue`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub approval_patterns: Vec<String>,
    pub deny_patterns: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            approval_patterns: [
                "Github_Create*",
                "Github_Update*",
                "Github_Merge*",
                "Github_Delete*",
                "Github_Manage*",
                "Github_Set*",
                "Github_Submit*",
                "Github_Assign*",
                "Github_Resolve*",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            deny_patterns: vec![],
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_github_agent() {
        let cfg = Config::default();
        assert_eq!(cfg.arcade.toolkits, vec!["Github".to_string()]);
        assert!(cfg.arcade.tools.is_empty());
        assert_eq!(cfg.arcade.tool_limit, 100);
        assert_eq!(cfg.agent.thread_id, "1");
        assert!(cfg.agent.system_prompt.starts_with("# GitHub Assistant (ReAct)"));
        assert_eq!(cfg.agent.auth_timeout_secs, 0);
    }

    #[test]
    fn default_model_reads_openai_key_env() {
        let m = ModelConfig::default();
        assert_eq!(m.provider, "openai");
        assert_eq!(m.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
        assert!(m.name.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"[arcade]
tool_limit = 10"#,
        )
        .unwrap();
        assert_eq!(cfg.arcade.tool_limit, 10);
        assert_eq!(cfg.arcade.base_url, "https://api.arcade.dev");
        assert_eq!(cfg.arcade.toolkits, vec!["Github".to_string()]);
    }

    #[test]
    fn redacted_masks_explicit_keys_only() {
        let mut cfg = Config::default();
        cfg.model.api_key = Some("sk-secret".into());
        cfg.arcade.api_key = Some("arc-secret".into());
        let shown = cfg.redacted();
        assert_eq!(shown.model.api_key.as_deref(), Some("****"));
        assert_eq!(shown.arcade.api_key.as_deref(), Some("****"));
        assert_eq!(shown.model.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
        assert_eq!(cfg.model.api_key.as_deref(), Some("sk-secret"));
        assert!(Config::default().redacted().arcade.api_key.is_none());
    }

    #[test]
    fn default_approval_patterns_cover_merges() {
        let t = ToolsConfig::default();
        assert!(t.approval_patterns.iter().any(|p| p == "Github_Merge*"));
        assert!(t.deny_patterns.is_empty());
    }
}
