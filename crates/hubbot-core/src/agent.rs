// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hubbot_config::AgentConfig;
use hubbot_model::{CompletionRequest, Message, ModelProvider, ResponseEvent};
use hubbot_tools::{
    ApprovalPolicy, AuthorizationStatus, Tool, ToolCall, ToolOutput, ToolRegistry,
};

use crate::{
    checkpoint::{Checkpoint, MemoryCheckpointer, PendingRound, Stage, WaitingCall},
    error::AgentError,
    events::{AgentEvent, Interrupt, PauseEvent, Resume, TurnInput},
    runtime::{AgentRuntime, AgentStream},
};

type EventTx = mpsc::Sender<Result<AgentEvent, AgentError>>;

const EVENT_BUFFER: usize = 64;

/// The core agent.  Drives the model ↔ tool loop for any number of threads
/// stored in a shared [`MemoryCheckpointer`].
///
/// Cloning is cheap; clones share the model, tools and store.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    config: Arc<AgentConfig>,
    checkpointer: Arc<MemoryCheckpointer>,
}

/// How far a tool call has already got through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Authorized,
    Approved,
}

enum Gate {
    Run,
    Pause(Stage, PauseEvent),
    Resolved(ToolOutput),
}

impl Agent {
    pub fn new(
        model: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        config: Arc<AgentConfig>,
        checkpointer: Arc<MemoryCheckpointer>,
    ) -> Self {
        Self { inner: Arc::new(AgentInner { model, tools, config, checkpointer }) }
    }

    pub fn checkpointer(&self) -> &Arc<MemoryCheckpointer> {
        &self.inner.checkpointer
    }
}

impl AgentRuntime for Agent {
    fn advance(&self, thread_id: &str, input: TurnInput) -> AgentStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let inner = Arc::clone(&self.inner);
        let thread_id = thread_id.to_string();
        let task = tokio::spawn(async move {
            if let Err(e) = inner.run_turn(&thread_id, input, &tx).await {
                debug!(thread = %thread_id, "turn failed: {e}");
                let _ = tx.send(Err(e)).await;
            }
        });
        AgentStream::new(rx, task)
    }
}

impl AgentInner {
    /// Load the thread, advance a working copy and store it back.  The thread
    /// stays locked for the whole turn.
    async fn run_turn(
        &self,
        thread_id: &str,
        input: TurnInput,
        tx: &EventTx,
    ) -> Result<(), AgentError> {
        let slot = self.checkpointer.slot(thread_id).await;
        let mut stored = slot.lock().await;

        if let TurnInput::Resume(resume) = &input {
            check_resume(&stored, resume)?;
        }

        debug!(thread = %thread_id, "advancing thread");
        let mut state = stored.clone();
        let result = self.drive(&mut state, input, tx).await;
        state.updated_at = chrono::Utc::now();
        *stored = state;
        result
    }

    async fn drive(
        &self,
        state: &mut Checkpoint,
        input: TurnInput,
        tx: &EventTx,
    ) -> Result<(), AgentError> {
        match input {
            TurnInput::User(text) => {
                if let Some(stale) = state.pending.take() {
                    close_stale_round(state, stale);
                }
                if state.messages.is_empty() {
                    state.messages.push(Message::system(self.config.system_prompt.clone()));
                }
                state.messages.push(Message::user(text));
                self.run_agentic_loop(state, None, Vec::new(), tx).await
            }
            TurnInput::Resume(resume) => {
                let mut round = state.pending.take().ok_or(AgentError::NothingToResume)?;
                let waiting = std::mem::take(&mut round.waiting);
                let mut steps = Vec::with_capacity(waiting.len());
                for (w, decision) in waiting.into_iter().zip(resume.into_decisions()) {
                    let call = &round.calls[w.index];
                    if decision.authorized {
                        let step = match w.stage {
                            Stage::Authorization => Step::Authorized,
                            Stage::Approval => Step::Approved,
                        };
                        steps.push((w.index, step));
                    } else {
                        info!(tool = %call.name, stage = ?w.stage, "tool call denied by user");
                        round.outputs[w.index] = Some(denial(call, w.stage));
                    }
                }
                self.run_agentic_loop(state, Some(round), steps, tx).await
            }
        }
    }

    /// Settle `round` (if any), then keep asking the model until it stops
    /// calling tools or a call pauses.
    async fn run_agentic_loop(
        &self,
        state: &mut Checkpoint,
        mut round: Option<PendingRound>,
        mut steps: Vec<(usize, Step)>,
        tx: &EventTx,
    ) -> Result<(), AgentError> {
        let mut rounds = round.as_ref().map_or(0, |r| r.rounds);

        loop {
            if let Some(mut r) = round.take() {
                let paused = self.settle_round(state, &mut r, std::mem::take(&mut steps), tx).await;
                if paused {
                    state.pending = Some(r);
                    return Ok(());
                }
            }

            rounds += 1;
            if rounds > self.config.max_tool_rounds {
                // One final tool-free round so the model can summarise
                // instead of stopping mid-thought.
                let wrap_msg = format!(
                    "You have reached the maximum tool-call budget ({} rounds). \
                     Do not call any more tools. Summarise what was done and what remains.",
                    self.config.max_tool_rounds
                );
                state.messages.push(Message::user(wrap_msg));
                let (text, _) = self.stream_one_turn(&state.messages, false).await?;
                if !text.is_empty() {
                    record(state, Message::assistant(text), tx).await;
                }
                return Ok(());
            }

            let (text, tool_calls) = self.stream_one_turn(&state.messages, true).await?;

            if !text.is_empty() {
                record(state, Message::assistant(text), tx).await;
            }

            if tool_calls.is_empty() {
                return Ok(());
            }

            // Phase 1: every tool-call message goes in before any result, as
            // OpenAI's parallel-tool-call format requires.
            for tc in &tool_calls {
                record(state, Message::tool_call(&tc.id, &tc.name, tc.args.to_string()), tx).await;
            }

            steps = (0..tool_calls.len()).map(|i| (i, Step::Start)).collect();
            round = Some(PendingRound::new(tool_calls, rounds));
        }
    }

    /// Gate and run the calls named by `steps`.  Returns `true` when at
    /// least one call is left waiting on an interrupt.
    async fn settle_round(
        &self,
        state: &mut Checkpoint,
        round: &mut PendingRound,
        steps: Vec<(usize, Step)>,
        tx: &EventTx,
    ) -> bool {
        let mut ready = Vec::new();
        for (index, step) in steps {
            match self.gate(&round.calls[index], step).await {
                Gate::Run => ready.push(index),
                Gate::Resolved(output) => round.outputs[index] = Some(output),
                Gate::Pause(stage, event) => round.waiting.push(WaitingCall {
                    index,
                    stage,
                    interrupt: Interrupt { id: Uuid::new_v4().to_string(), event },
                }),
            }
        }

        // Phase 2: run cleared calls in parallel, then await them in order.
        let mut tasks = Vec::with_capacity(ready.len());
        for index in ready {
            let registry = Arc::clone(&self.tools);
            let tc = round.calls[index].clone();
            tasks.push((index, tokio::spawn(async move { registry.execute(&tc).await })));
        }
        for (index, task) in tasks {
            let output = match task.await {
                Ok(output) => output,
                Err(e) => ToolOutput::err(
                    &round.calls[index].id,
                    format!("tool execution panicked: {e}"),
                ),
            };
            round.outputs[index] = Some(output);
        }

        if !round.waiting.is_empty() {
            for w in &round.waiting {
                let _ = tx.send(Ok(AgentEvent::Interrupt(w.interrupt.clone()))).await;
            }
            return true;
        }

        // Phase 3: results in call order.
        for (call, output) in round.calls.iter().zip(round.outputs.iter_mut()) {
            let content = match output.take() {
                Some(o) => o.content,
                None => format!("{} was not run", call.name),
            };
            record(state, Message::tool_result(&call.id, content), tx).await;
        }
        false
    }

    /// Decide whether `call` may run now.  Authorization comes first, then
    /// approval; a call resumed past a stage is not asked again.
    async fn gate(&self, call: &ToolCall, step: Step) -> Gate {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "model called an unknown tool");
            return Gate::Resolved(ToolOutput::err(&call.id, format!("unknown tool: {}", call.name)));
        };

        let policy = tool.default_policy();
        if policy == ApprovalPolicy::Deny {
            return Gate::Resolved(ToolOutput::err(
                &call.id,
                format!("calls to {} are disabled by configuration", call.name),
            ));
        }

        if step == Step::Start {
            match tool.authorize().await {
                Ok(auth) if auth.is_completed() => {}
                Ok(auth) if auth.status == AuthorizationStatus::Failed => {
                    return Gate::Resolved(ToolOutput::err(
                        &call.id,
                        format!("authorization for {} failed", call.name),
                    ));
                }
                Ok(auth) => {
                    debug!(tool = %call.name, auth_id = %auth.id, "tool call needs authorization");
                    return Gate::Pause(
                        Stage::Authorization,
                        PauseEvent::Authorization {
                            tool_name: call.name.clone(),
                            authorization: auth,
                        },
                    );
                }
                Err(e) => {
                    warn!(tool = %call.name, "authorization request failed: {e}");
                    return Gate::Resolved(ToolOutput::err(
                        &call.id,
                        format!("could not authorize {}: {e}", call.name),
                    ));
                }
            }
        }

        if step != Step::Approved && policy == ApprovalPolicy::Ask {
            return Gate::Pause(
                Stage::Approval,
                PauseEvent::Approval { tool_name: call.name.clone(), input: call.args.clone() },
            );
        }

        Gate::Run
    }

    /// Call the model once and collect its text and tool calls.
    async fn stream_one_turn(
        &self,
        messages: &[Message],
        with_tools: bool,
    ) -> anyhow::Result<(String, Vec<ToolCall>)> {
        let tools: Vec<hubbot_model::ToolSchema> = if with_tools {
            self.tools
                .schemas()
                .into_iter()
                .map(|s| hubbot_model::ToolSchema {
                    name: s.name,
                    description: s.description,
                    parameters: s.parameters,
                })
                .collect()
        } else {
            vec![]
        };

        let req = CompletionRequest { messages: messages.to_vec(), tools, stream: true };

        let mut stream = self.model.complete(req).await.context("model completion failed")?;

        let mut full_text = String::new();
        // Keyed by the parallel-tool-call index from the provider.
        let mut pending_tcs: HashMap<u32, PendingToolCall> = HashMap::new();

        while let Some(event) = stream.next().await {
            match event? {
                ResponseEvent::TextDelta(delta) => full_text.push_str(&delta),
                ResponseEvent::ToolCall { index, id, name, arguments } => {
                    let ptc = pending_tcs.entry(index).or_default();
                    if !id.is_empty() {
                        ptc.id = id;
                    }
                    if !name.is_empty() {
                        ptc.name = name;
                    }
                    ptc.args_buf.push_str(&arguments);
                }
                ResponseEvent::Usage { input_tokens, output_tokens } => {
                    debug!(input_tokens, output_tokens, "token usage");
                }
                ResponseEvent::Done => break,
                ResponseEvent::Error(e) => anyhow::bail!("model stream error: {e}"),
            }
        }

        // Calls without a name cannot be dispatched and are dropped; a
        // missing id gets a synthetic one so the history stays valid.
        let mut pending_sorted: Vec<(u32, PendingToolCall)> = pending_tcs.into_iter().collect();
        pending_sorted.sort_by_key(|(idx, _)| *idx);
        let mut tool_calls = Vec::with_capacity(pending_sorted.len());
        for (i, (_, ptc)) in pending_sorted.into_iter().enumerate() {
            if ptc.name.is_empty() {
                warn!(
                    tool_call_id = %ptc.id,
                    "dropping tool call with empty name from model; cannot dispatch"
                );
                continue;
            }
            let mut tc = ptc.finish();
            if tc.id.is_empty() {
                tc.id = format!("tc_synthetic_{i}");
                warn!(tool_name = %tc.name, tool_call_id = %tc.id, "generated synthetic tool call id");
            }
            tool_calls.push(tc);
        }

        Ok((full_text, tool_calls))
    }
}

/// Reject a resume that does not answer exactly the pending interrupts.
fn check_resume(state: &Checkpoint, resume: &Resume) -> Result<(), AgentError> {
    let pending = state.pending.as_ref().ok_or(AgentError::NothingToResume)?;
    if resume.len() != pending.waiting.len() {
        return Err(AgentError::ResumeMismatch {
            expected: pending.waiting.len(),
            got: resume.len(),
        });
    }
    Ok(())
}

/// Give every call of an abandoned round a result so the history stays
/// well-formed for the next completion.
fn close_stale_round(state: &mut Checkpoint, round: PendingRound) {
    warn!(waiting = round.waiting.len(), "new message while tool calls were paused; closing them");
    for (call, output) in round.calls.iter().zip(round.outputs) {
        let content = match output {
            Some(o) => o.content,
            None => format!("{} was not run: the conversation moved on", call.name),
        };
        state.messages.push(Message::tool_result(&call.id, content));
    }
}

fn denial(call: &ToolCall, stage: Stage) -> ToolOutput {
    let msg = match stage {
        Stage::Authorization => format!("the user did not authorize {}; it was not run", call.name),
        Stage::Approval => format!("the user declined the call to {}; it was not run", call.name),
    };
    ToolOutput::err(&call.id, msg)
}

async fn record(state: &mut Checkpoint, msg: Message, tx: &EventTx) {
    state.messages.push(msg.clone());
    let _ = tx.send(Ok(AgentEvent::Message(msg))).await;
}

#[derive(Default)]
struct PendingToolCall {
    id: String,
    name: String,
    args_buf: String,
}

impl PendingToolCall {
    /// Always resolves to a JSON object; the next completion request would
    /// be rejected otherwise.
    fn finish(self) -> ToolCall {
        let args = if self.args_buf.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(&self.args_buf) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        tool_name = %self.name,
                        tool_call_id = %self.id,
                        args_buf = %self.args_buf,
                        error = %e,
                        "model sent tool call with invalid JSON arguments; substituting {{}}"
                    );
                    serde_json::Value::Object(Default::default())
                }
            }
        };
        ToolCall { id: self.id, name: self.name, args }
    }
}
