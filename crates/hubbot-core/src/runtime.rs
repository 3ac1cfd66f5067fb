// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::events::{AgentEvent, TurnInput};

/// Something that can advance a conversation thread.
pub trait AgentRuntime: Send + Sync {
    /// Start advancing `thread_id` with `input`.  The returned stream yields
    /// the turn's events and ends when the turn completes or pauses.  An
    /// error is always the last item.
    fn advance(&self, thread_id: &str, input: TurnInput) -> AgentStream;
}

/// Events of one running turn.  Dropping the stream cancels the turn; the
/// thread then keeps the state it had before the turn started.
pub struct AgentStream {
    inner: ReceiverStream<Result<AgentEvent, AgentError>>,
    task: Option<JoinHandle<()>>,
}

impl AgentStream {
    pub fn new(
        rx: tokio::sync::mpsc::Receiver<Result<AgentEvent, AgentError>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self { inner: ReceiverStream::new(rx), task: Some(task) }
    }

    /// A stream over events produced elsewhere, with no task to cancel.
    pub fn detached(rx: tokio::sync::mpsc::Receiver<Result<AgentEvent, AgentError>>) -> Self {
        Self { inner: ReceiverStream::new(rx), task: None }
    }
}

impl Stream for AgentStream {
    type Item = Result<AgentEvent, AgentError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for AgentStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
