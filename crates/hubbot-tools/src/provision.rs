// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Startup tool provisioning: ask the broker for the configured toolkits and
//! tools and turn them into descriptors.

use std::collections::BTreeMap;

use hubbot_config::ArcadeConfig;
use tracing::{debug, info};

use crate::broker::{BrokerError, ToolBroker};
use crate::descriptor::ToolDescriptor;

/// What to provision.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub user_id: String,
    pub toolkits: Vec<String>,
    pub tools: Vec<String>,
    /// Upper bound on the number of tools in the resulting catalog.
    pub limit: usize,
}

impl ProvisionRequest {
    pub fn from_config(cfg: &ArcadeConfig) -> Self {
        Self {
            user_id: cfg.user_id.clone(),
            toolkits: cfg.toolkits.clone(),
            tools: cfg.tools.clone(),
            limit: cfg.tool_limit,
        }
    }
}

/// Provisioned tools keyed by model-facing name.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Insert unless the catalog is full; returns whether it was stored.
    fn insert(&mut self, d: ToolDescriptor, limit: usize) -> bool {
        if self.tools.contains_key(&d.name) {
            return true;
        }
        if self.tools.len() >= limit {
            return false;
        }
        self.tools.insert(d.name.clone(), d);
        true
    }
}

impl IntoIterator for ToolCatalog {
    type Item = ToolDescriptor;
    type IntoIter = std::collections::btree_map::IntoValues<String, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.into_values()
    }
}

/// Fetch every tool of each toolkit, then each individually named tool, until
/// `req.limit` tools are collected.  Duplicates collapse by name.
pub async fn provision(
    broker: &dyn ToolBroker,
    req: &ProvisionRequest,
) -> Result<ToolCatalog, BrokerError> {
    let mut catalog = ToolCatalog::default();

    'toolkits: for toolkit in &req.toolkits {
        let mut offset = 0;
        loop {
            let remaining = req.limit.saturating_sub(catalog.len());
            if remaining == 0 {
                break 'toolkits;
            }
            let page = broker.list_tools(Some(toolkit), remaining, offset).await?;
            let fetched = page.items.len();
            let before = catalog.len();
            debug!(%toolkit, offset, fetched, "received tool page");
            for def in &page.items {
                if !catalog.insert(ToolDescriptor::from_definition(def), req.limit) {
                    break 'toolkits;
                }
            }
            offset += fetched;
            // A page with nothing new means the broker is not paging.
            let exhausted = fetched == 0
                || catalog.len() == before
                || page.total_count.is_some_and(|total| offset >= total);
            if exhausted {
                break;
            }
        }
    }

    for name in &req.tools {
        if catalog.len() >= req.limit {
            break;
        }
        let def = broker.get_tool(name).await?;
        catalog.insert(ToolDescriptor::from_definition(&def), req.limit);
    }

    info!(tools = catalog.len(), "provisioned tools");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::broker::{
        AuthorizationResponse, ExecuteResponse, ToolDefinition, ToolPage, ToolkitRef,
    };

    /// Serves a fixed list per toolkit, `page` tools at a time.
    struct FakeBroker {
        toolkits: Vec<(&'static str, Vec<&'static str>)>,
        page: usize,
        /// Serve from the start on every call and omit `total_count`.
        ignores_offset: bool,
        list_calls: Mutex<usize>,
    }

    fn def(toolkit: &str, name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.into(),
            qualified_name: format!("{toolkit}.{name}"),
            toolkit: ToolkitRef { name: toolkit.into(), version: None },
            ..Default::default()
        }
    }

    #[async_trait]
    impl ToolBroker for FakeBroker {
        async fn list_tools(
            &self,
            toolkit: Option<&str>,
            limit: usize,
            offset: usize,
        ) -> Result<ToolPage, BrokerError> {
            *self.list_calls.lock().unwrap() += 1;
            let (tk, names) = self
                .toolkits
                .iter()
                .find(|(tk, _)| Some(*tk) == toolkit)
                .expect("unknown toolkit");
            let skip = if self.ignores_offset { 0 } else { offset };
            let items = names
                .iter()
                .skip(skip)
                .take(limit.min(self.page))
                .map(|n| def(tk, n))
                .collect();
            let total_count = (!self.ignores_offset).then_some(names.len());
            Ok(ToolPage { items, total_count })
        }

        async fn get_tool(&self, name: &str) -> Result<ToolDefinition, BrokerError> {
            let (tk, n) = name.split_once('.').unwrap();
            Ok(def(tk, n))
        }

        async fn authorize(&self, _: &str, _: &str) -> Result<AuthorizationResponse, BrokerError> {
            unreachable!()
        }

        async fn auth_status(&self, _: &str, _: u32) -> Result<AuthorizationResponse, BrokerError> {
            unreachable!()
        }

        async fn execute(&self, _: &str, _: &Value, _: &str) -> Result<ExecuteResponse, BrokerError> {
            unreachable!()
        }
    }

    fn request(toolkits: &[&str], tools: &[&str], limit: usize) -> ProvisionRequest {
        ProvisionRequest {
            user_id: "me".into(),
            toolkits: toolkits.iter().map(|s| s.to_string()).collect(),
            tools: tools.iter().map(|s| s.to_string()).collect(),
            limit,
        }
    }

    fn github(page: usize) -> FakeBroker {
        FakeBroker {
            toolkits: vec![
                ("Github", vec!["CreateIssue", "GetIssue", "ListIssues", "MergePullRequest"]),
                ("Slack", vec!["SendMessage"]),
            ],
            page,
            ignores_offset: false,
            list_calls: Mutex::new(0),
        }
    }

    #[tokio::test]
    async fn collects_all_pages_of_a_toolkit() {
        let broker = github(3);
        let catalog = provision(&broker, &request(&["Github"], &[], 100)).await.unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get("Github_MergePullRequest").is_some());
        assert_eq!(*broker.list_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn broker_ignoring_offset_does_not_loop() {
        let broker = FakeBroker { ignores_offset: true, ..github(2) };
        let catalog = provision(&broker, &request(&["Github"], &[], 100)).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(*broker.list_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn stops_at_limit() {
        let broker = github(10);
        let catalog = provision(&broker, &request(&["Github"], &["Slack.SendMessage"], 2))
            .await
            .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("Slack_SendMessage").is_none());
    }

    #[tokio::test]
    async fn individual_tools_are_added_and_deduplicated() {
        let broker = github(10);
        let catalog = provision(
            &broker,
            &request(&["Github"], &["Slack.SendMessage", "Github.GetIssue"], 100),
        )
        .await
        .unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get("Slack_SendMessage").is_some());
    }

    #[tokio::test]
    async fn empty_request_yields_empty_catalog() {
        let broker = github(10);
        let catalog = provision(&broker, &request(&[], &[], 100)).await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn catalog_iterates_in_name_order() {
        let broker = github(10);
        let catalog = provision(&broker, &request(&["Github"], &[], 100)).await.unwrap();
        let names: Vec<_> = catalog.iter().map(|d| d.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
