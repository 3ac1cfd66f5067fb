// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use hubbot_model::Message;
use hubbot_tools::AuthorizationResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events emitted by the agent while advancing a thread.
/// The chat loop consumes these to drive its output.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A message was appended to the thread (assistant text, tool call or
    /// tool result).
    Message(Message),
    /// The turn cannot continue until the interrupt is answered.
    Interrupt(Interrupt),
}

/// Why a tool call is paused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PauseEvent {
    /// The user must grant access in a browser before the tool can run.
    Authorization {
        tool_name: String,
        authorization: AuthorizationResponse,
    },
    /// The user must approve this particular call.
    Approval { tool_name: String, input: Value },
    /// Any pause this client does not understand.  Always answered with a
    /// denial.
    #[serde(other)]
    Unknown,
}

impl PauseEvent {
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::Authorization { tool_name, .. } | Self::Approval { tool_name, .. } => {
                Some(tool_name)
            }
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    pub id: String,
    pub event: PauseEvent,
}

/// Answer to one interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub authorized: bool,
}

impl Decision {
    pub fn granted() -> Self {
        Self { authorized: true }
    }

    pub fn denied() -> Self {
        Self { authorized: false }
    }
}

/// Decisions for every interrupt of a paused turn, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resume {
    Single(Decision),
    Many(Vec<Decision>),
}

impl Resume {
    /// A single decision stays bare, anything else becomes a sequence.
    pub fn from_decisions(mut decisions: Vec<Decision>) -> Self {
        if decisions.len() == 1 {
            if let Some(d) = decisions.pop() {
                return Self::Single(d);
            }
        }
        Self::Many(decisions)
    }

    pub fn into_decisions(self) -> Vec<Decision> {
        match self {
            Self::Single(d) => vec![d],
            Self::Many(ds) => ds,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(ds) => ds.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What advances a thread: a new user message, or answers to the pending
/// interrupts.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    User(String),
    Resume(Resume),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn one_decision_is_bundled_bare() {
        let r = Resume::from_decisions(vec![Decision::granted()]);
        assert_eq!(r, Resume::Single(Decision::granted()));
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({ "authorized": true }));
    }

    #[test]
    fn several_decisions_keep_order() {
        let r = Resume::from_decisions(vec![Decision::granted(), Decision::denied()]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.into_decisions(), vec![Decision::granted(), Decision::denied()]);
    }

    #[test]
    fn unknown_kind_deserialises_to_unknown() {
        let ev: PauseEvent =
            serde_json::from_value(json!({ "kind": "captcha", "tool_name": "x" })).unwrap();
        assert_eq!(ev, PauseEvent::Unknown);
        assert!(ev.tool_name().is_none());
    }

    #[test]
    fn approval_round_trips_through_tagged_form() {
        let ev = PauseEvent::Approval {
            tool_name: "Github_MergePullRequest".into(),
            input: json!({ "pull_request_number": 9 }),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["kind"], "approval");
        assert_eq!(serde_json::from_value::<PauseEvent>(v).unwrap(), ev);
    }
}
