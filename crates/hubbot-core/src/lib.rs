// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod agent;
mod checkpoint;
mod error;
mod events;
mod runtime;

pub use agent::Agent;
pub use checkpoint::{Checkpoint, MemoryCheckpointer, PendingRound, Stage, WaitingCall};
pub use error::AgentError;
pub use events::{AgentEvent, Decision, Interrupt, PauseEvent, Resume, TurnInput};
pub use runtime::{AgentRuntime, AgentStream};
