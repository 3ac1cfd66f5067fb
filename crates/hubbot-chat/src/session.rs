// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use crossterm::style::Stylize;
use futures::StreamExt;
use tracing::{debug, error};

use hubbot_core::{AgentEvent, AgentRuntime, Interrupt, Resume, TurnInput};

use crate::console::Console;
use crate::render::format_message;
use crate::resolver::InterruptResolver;

pub const PROMPT: &str = "> ";
pub const WELCOME: &str = "Welcome to the chatbot! Type 'exit' to quit.";
pub const FAREWELL: &str = "👋 Bye...";
const EXIT: &str = "exit";

/// The interactive read → advance → resolve → resume loop for one thread.
pub struct ChatSession {
    runtime: Arc<dyn AgentRuntime>,
    resolver: InterruptResolver,
    thread_id: String,
}

impl ChatSession {
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        resolver: InterruptResolver,
        thread_id: impl Into<String>,
    ) -> Self {
        Self { runtime, resolver, thread_id: thread_id.into() }
    }

    /// Run until `exit` or end of input.  A failed turn is reported and the
    /// loop goes on; only console failures end the session with an error.
    pub async fn run(&self, console: &mut dyn Console) -> anyhow::Result<()> {
        console.say(&WELCOME.green().to_string());

        while let Some(line) = console.read_line(PROMPT).await? {
            let input = line.trim();
            if input.eq_ignore_ascii_case(EXIT) {
                break;
            }
            if input.is_empty() {
                continue;
            }
            if let Err(e) = self.turn(input, console).await {
                error!(thread = %self.thread_id, "turn failed: {e:#}");
                console.warn(&format!("Error: {e:#}"));
            }
        }

        console.say(&FAREWELL.red().to_string());
        Ok(())
    }

    /// Advance with the user's line, then keep resuming until nothing is
    /// left to decide.
    async fn turn(&self, input: &str, console: &mut dyn Console) -> anyhow::Result<()> {
        let mut next = TurnInput::User(input.to_string());
        loop {
            let interrupts = self.drain(next, console).await?;
            if interrupts.is_empty() {
                return Ok(());
            }
            debug!(count = interrupts.len(), "resolving interrupts");
            let mut decisions = Vec::with_capacity(interrupts.len());
            for interrupt in &interrupts {
                decisions.push(self.resolver.resolve(&interrupt.event, console).await?);
            }
            next = TurnInput::Resume(Resume::from_decisions(decisions));
        }
    }

    /// Print messages as they arrive and collect the interrupts.
    async fn drain(
        &self,
        input: TurnInput,
        console: &mut dyn Console,
    ) -> anyhow::Result<Vec<Interrupt>> {
        let mut stream = self.runtime.advance(&self.thread_id, input);
        let mut interrupts = Vec::new();
        while let Some(item) = stream.next().await {
            match item? {
                AgentEvent::Message(msg) => console.say(&format!("🤖: {}", format_message(&msg))),
                AgentEvent::Interrupt(i) => interrupts.push(i),
            }
        }
        Ok(interrupts)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hubbot_core::{AgentError, AgentStream, Decision, PauseEvent};
    use hubbot_model::Message;
    use hubbot_tools::{AuthWaiter, AuthorizationResponse, BrokerError};
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::console::ScriptedConsole;

    /// Replays one canned batch of events per `advance` and records inputs.
    #[derive(Default)]
    struct ScriptedRuntime {
        batches: Mutex<VecDeque<Vec<Result<AgentEvent, AgentError>>>>,
        inputs: Mutex<Vec<TurnInput>>,
    }

    impl ScriptedRuntime {
        fn new(batches: Vec<Vec<Result<AgentEvent, AgentError>>>) -> Arc<Self> {
            Arc::new(Self { batches: Mutex::new(batches.into()), ..Self::default() })
        }

        fn inputs(&self) -> Vec<TurnInput> {
            self.inputs.lock().unwrap().clone()
        }
    }

    impl AgentRuntime for ScriptedRuntime {
        fn advance(&self, _thread_id: &str, input: TurnInput) -> AgentStream {
            self.inputs.lock().unwrap().push(input);
            let batch = self.batches.lock().unwrap().pop_front().unwrap_or_default();
            let (tx, rx) = mpsc::channel(batch.len().max(1));
            for item in batch {
                tx.try_send(item).unwrap();
            }
            AgentStream::detached(rx)
        }
    }

    struct NeverWaits;

    #[async_trait]
    impl AuthWaiter for NeverWaits {
        async fn wait_for_completion(&self, _: &str) -> Result<AuthorizationResponse, BrokerError> {
            Ok(AuthorizationResponse::completed())
        }
    }

    fn session(runtime: Arc<ScriptedRuntime>) -> ChatSession {
        ChatSession::new(runtime, InterruptResolver::new(Arc::new(NeverWaits), None), "1")
    }

    fn approval(tool: &str) -> Result<AgentEvent, AgentError> {
        Ok(AgentEvent::Interrupt(Interrupt {
            id: format!("i-{tool}"),
            event: PauseEvent::Approval { tool_name: tool.into(), input: json!({}) },
        }))
    }

    fn said(text: &str) -> Result<AgentEvent, AgentError> {
        Ok(AgentEvent::Message(Message::assistant(text)))
    }

    #[tokio::test]
    async fn exit_in_any_case_ends_without_a_turn() {
        for word in ["exit", "EXIT", "  Exit  "] {
            let runtime = ScriptedRuntime::new(vec![]);
            let mut console = ScriptedConsole::new([word, "never read"]);
            session(runtime.clone()).run(&mut console).await.unwrap();
            assert!(runtime.inputs().is_empty());
            assert!(console.out[0].contains(WELCOME));
            assert!(console.out.last().unwrap().contains(FAREWELL));
            assert_eq!(console.prompts, vec![PROMPT]);
        }
    }

    #[tokio::test]
    async fn end_of_input_says_goodbye() {
        let runtime = ScriptedRuntime::new(vec![]);
        let mut console = ScriptedConsole::default();
        session(runtime).run(&mut console).await.unwrap();
        assert!(console.out.last().unwrap().contains(FAREWELL));
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let runtime = ScriptedRuntime::new(vec![]);
        let mut console = ScriptedConsole::new(["", "   ", "exit"]);
        session(runtime.clone()).run(&mut console).await.unwrap();
        assert!(runtime.inputs().is_empty());
        assert_eq!(console.prompts.len(), 3);
    }

    #[tokio::test]
    async fn messages_are_printed_with_robot_prefix() {
        let runtime = ScriptedRuntime::new(vec![vec![said("hello!")]]);
        let mut console = ScriptedConsole::new(["hi", "exit"]);
        session(runtime.clone()).run(&mut console).await.unwrap();
        assert_eq!(runtime.inputs(), vec![TurnInput::User("hi".into())]);
        assert!(console.out.contains(&"🤖: hello!".to_string()));
    }

    #[tokio::test]
    async fn single_interrupt_resumes_with_bare_decision() {
        let runtime = ScriptedRuntime::new(vec![
            vec![approval("Github_CreateIssue")],
            vec![said("created")],
        ]);
        let mut console = ScriptedConsole::new(["file it", "yes", "exit"]);
        session(runtime.clone()).run(&mut console).await.unwrap();

        assert_eq!(
            runtime.inputs(),
            vec![
                TurnInput::User("file it".into()),
                TurnInput::Resume(Resume::Single(Decision::granted())),
            ]
        );
        assert!(console.out.contains(&"🤖: created".to_string()));
    }

    #[tokio::test]
    async fn several_interrupts_resume_with_ordered_decisions() {
        let runtime = ScriptedRuntime::new(vec![
            vec![approval("Github_CreateIssue"), approval("Github_CloseIssue")],
            vec![said("done")],
        ]);
        let mut console = ScriptedConsole::new(["go", "no", "yes", "exit"]);
        session(runtime.clone()).run(&mut console).await.unwrap();

        assert_eq!(
            runtime.inputs()[1],
            TurnInput::Resume(Resume::Many(vec![Decision::denied(), Decision::granted()]))
        );
    }

    #[tokio::test]
    async fn chained_pauses_keep_resuming() {
        let runtime = ScriptedRuntime::new(vec![
            vec![approval("a")],
            vec![approval("b")],
            vec![said("finished")],
        ]);
        let mut console = ScriptedConsole::new(["go", "yes", "yes", "exit"]);
        session(runtime.clone()).run(&mut console).await.unwrap();
        assert_eq!(runtime.inputs().len(), 3);
        assert!(console.out.contains(&"🤖: finished".to_string()));
    }

    #[tokio::test]
    async fn turn_errors_are_reported_and_the_loop_continues() {
        let runtime = ScriptedRuntime::new(vec![
            vec![Err(AgentError::Model(anyhow::anyhow!("upstream 500")))],
            vec![said("recovered")],
        ]);
        let mut console = ScriptedConsole::new(["first", "second", "exit"]);
        session(runtime.clone()).run(&mut console).await.unwrap();

        assert!(console.stderr().contains("upstream 500"));
        assert_eq!(runtime.inputs().len(), 2);
        assert!(console.out.contains(&"🤖: recovered".to_string()));
        assert!(console.out.last().unwrap().contains(FAREWELL));
    }
}
