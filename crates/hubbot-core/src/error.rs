// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Failures that end a turn.  Tool failures never appear here: they become
/// tool results the model can read.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("there is no paused turn to resume")]
    NothingToResume,

    #[error("expected {expected} decision(s) for the pending interrupts, got {got}")]
    ResumeMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Model(#[from] anyhow::Error),
}
