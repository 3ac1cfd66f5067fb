// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hubbot_model::Message;
use hubbot_tools::{ToolCall, ToolOutput};
use tokio::sync::Mutex;

use crate::events::Interrupt;

/// Which gate a paused tool call is waiting at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authorization,
    Approval,
}

/// A tool call held back until its interrupt is answered.
#[derive(Debug, Clone)]
pub struct WaitingCall {
    /// Position in [`PendingRound::calls`].
    pub index: usize,
    pub stage: Stage,
    pub interrupt: Interrupt,
}

/// The tool calls of one model round that has not finished yet.
#[derive(Debug, Clone)]
pub struct PendingRound {
    pub calls: Vec<ToolCall>,
    /// Results by call position; `None` until the call is resolved.
    pub outputs: Vec<Option<ToolOutput>>,
    /// Interrupted calls in emission order.
    pub waiting: Vec<WaitingCall>,
    /// Model rounds used so far in this turn.
    pub rounds: u32,
}

impl PendingRound {
    pub fn new(calls: Vec<ToolCall>, rounds: u32) -> Self {
        let outputs = vec![None; calls.len()];
        Self { calls, outputs, waiting: Vec::new(), rounds }
    }

    pub fn interrupts(&self) -> impl Iterator<Item = &Interrupt> {
        self.waiting.iter().map(|w| &w.interrupt)
    }
}

/// Everything stored for one conversation thread.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub messages: Vec<Message>,
    pub pending: Option<PendingRound>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self { messages: Vec::new(), pending: None, updated_at: Utc::now() }
    }
}

/// In-memory conversation store keyed by thread id.
///
/// Each thread sits behind its own lock so a turn holds its thread from load
/// to save while other threads stay available.
#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    threads: Mutex<HashMap<String, Arc<Mutex<Checkpoint>>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `thread_id`, created empty on first use.
    pub(crate) async fn slot(&self, thread_id: &str) -> Arc<Mutex<Checkpoint>> {
        let mut threads = self.threads.lock().await;
        Arc::clone(threads.entry(thread_id.to_string()).or_default())
    }

    /// A copy of the stored state, if the thread exists.
    pub async fn get(&self, thread_id: &str) -> Option<Checkpoint> {
        let slot = self.threads.lock().await.get(thread_id).cloned()?;
        let cp = slot.lock().await;
        Some(cp.clone())
    }

    /// Interrupts the thread is currently paused on.
    pub async fn pending_interrupts(&self, thread_id: &str) -> Vec<Interrupt> {
        self.get(thread_id)
            .await
            .and_then(|cp| cp.pending)
            .map(|p| p.interrupts().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_thread_has_no_state() {
        let store = MemoryCheckpointer::new();
        assert!(store.get("1").await.is_none());
        assert!(store.pending_interrupts("1").await.is_empty());
    }

    #[tokio::test]
    async fn slot_is_shared_per_thread() {
        let store = MemoryCheckpointer::new();
        {
            let slot = store.slot("1").await;
            slot.lock().await.messages.push(Message::user("hi"));
        }
        let again = store.slot("1").await;
        assert_eq!(again.lock().await.messages.len(), 1);
        assert!(store.get("2").await.is_none());
    }

    #[test]
    fn new_round_has_no_outputs() {
        let call = ToolCall { id: "a".into(), name: "t".into(), args: serde_json::json!({}) };
        let round = PendingRound::new(vec![call.clone(), call], 1);
        assert_eq!(round.outputs, vec![None, None]);
        assert_eq!(round.interrupts().count(), 0);
    }
}
