// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::stream;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent};

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deterministic mock provider.  Echoes the last user message back as the
/// assistant response and never calls tools.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl crate::ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let reply = req
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, crate::Role::User))
            .and_then(|m| m.as_text())
            .unwrap_or("[no input]")
            .to_string();

        let events: Vec<anyhow::Result<ResponseEvent>> = vec![
            Ok(ResponseEvent::TextDelta(format!("MOCK: {reply}"))),
            Ok(ResponseEvent::Usage { input_tokens: 10, output_tokens: 10 }),
            Ok(ResponseEvent::Done),
        ];
        Ok(Box::pin(stream::iter(events)))
    }
}

/// A pre-scripted mock provider.  Each call to `complete` pops the next
/// response script from the front of the queue.  This lets tests specify
/// exact event sequences – including tool calls – without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<Vec<ResponseEvent>>>>,
    /// Every `CompletionRequest` seen by this provider, oldest first.
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedMockProvider {
    /// Build a provider from a list of response scripts.
    /// The outer `Vec` is the ordered list of calls; the inner `Vec` is the
    /// sequence of [`ResponseEvent`]s emitted for that call.
    pub fn new(scripts: Vec<Vec<ResponseEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: provider that always returns a single text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![Self::text(reply)])
    }

    /// Convenience: provider that returns a tool call followed by a text reply.
    pub fn tool_then_text(
        tool_id: impl Into<String>,
        tool_name: impl Into<String>,
        args_json: impl Into<String>,
        final_text: impl Into<String>,
    ) -> Self {
        Self::new(vec![
            Self::tool_calls(&[(&tool_id.into(), &tool_name.into(), &args_json.into())]),
            Self::text(final_text),
        ])
    }

    /// Script for one round that streams `reply` and finishes.
    pub fn text(reply: impl Into<String>) -> Vec<ResponseEvent> {
        vec![ResponseEvent::TextDelta(reply.into()), ResponseEvent::Done]
    }

    /// Script for one round that emits `(id, name, args)` tool calls in order.
    pub fn tool_calls(calls: &[(&str, &str, &str)]) -> Vec<ResponseEvent> {
        let mut events: Vec<ResponseEvent> = calls
            .iter()
            .enumerate()
            .map(|(i, (id, name, args))| ResponseEvent::ToolCall {
                index: i as u32,
                id: id.to_string(),
                name: name.to_string(),
                arguments: args.to_string(),
            })
            .collect();
        events.push(ResponseEvent::Done);
        events
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        locked(&self.requests).len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        locked(&self.requests).last().cloned()
    }
}

#[async_trait]
impl crate::ModelProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        locked(&self.requests).push(req);
        let events = {
            let mut scripts = locked(&self.scripts);
            if scripts.is_empty() {
                // Default fallback when all scripts are consumed
                Self::text("[no more scripts]")
            } else {
                scripts.remove(0)
            }
        };
        let wrapped: Vec<anyhow::Result<ResponseEvent>> = events.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(wrapped)))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::{CompletionRequest, Message, ModelProvider, ResponseEvent};

    fn user_req() -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::user("hi")],
            stream: true,
            ..Default::default()
        }
    }

    async fn drain(p: &dyn ModelProvider) -> Vec<ResponseEvent> {
        let mut stream = p.complete(user_req()).await.unwrap();
        let mut events = Vec::new();
        while let Some(ev) = stream.next().await {
            events.push(ev.unwrap());
        }
        events
    }

    #[tokio::test]
    async fn mock_echoes_last_user_message_and_ends_with_done() {
        let events = drain(&MockProvider).await;
        assert!(matches!(&events[0], ResponseEvent::TextDelta(t) if t == "MOCK: hi"));
        assert!(matches!(events.last(), Some(ResponseEvent::Done)));
    }

    #[tokio::test]
    async fn scripted_tool_then_text_two_rounds() {
        let p = ScriptedMockProvider::tool_then_text(
            "call-1",
            "Github_ListIssues",
            r#"{"repo":"x"}"#,
            "done",
        );

        let round1 = drain(&p).await;
        assert!(round1.iter().any(
            |e| matches!(e, ResponseEvent::ToolCall { name, .. } if name == "Github_ListIssues")
        ));

        let round2 = drain(&p).await;
        assert!(round2.iter().any(|e| matches!(e, ResponseEvent::TextDelta(t) if t == "done")));
        assert_eq!(p.calls(), 2);
    }

    #[tokio::test]
    async fn scripted_tool_calls_get_distinct_indices() {
        let p = ScriptedMockProvider::new(vec![ScriptedMockProvider::tool_calls(&[
            ("a", "Github_GetIssue", "{}"),
            ("b", "Github_GetPullRequest", "{}"),
        ])]);
        let events = drain(&p).await;
        let indices: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                ResponseEvent::ToolCall { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[tokio::test]
    async fn scripted_fallback_when_scripts_exhausted() {
        let p = ScriptedMockProvider::new(vec![]);
        let events = drain(&p).await;
        assert!(matches!(&events[0], ResponseEvent::TextDelta(t) if t.contains("no more scripts")));
        assert!(p.last_request().is_some());
    }
}
