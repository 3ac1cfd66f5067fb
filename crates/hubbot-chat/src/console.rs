// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Line-oriented terminal the chat loop talks through.
#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line without its terminator.  `None` once
    /// input is exhausted.
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;

    /// Write a line to standard output.
    fn say(&mut self, line: &str);

    /// Write a line to standard error.
    fn warn(&mut self, line: &str);
}

/// The process's stdin/stdout/stderr.
pub struct StdConsole {
    stdin: BufReader<Stdin>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self { stdin: BufReader::new(tokio::io::stdin()) }
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing on it.
async fn read_lossy_line<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&raw);
    Ok(Some(line.trim_end_matches('\n').trim_end_matches('\r').to_string()))
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        Ok(read_lossy_line(&mut self.stdin).await?)
    }

    fn say(&mut self, line: &str) {
        println!("{line}");
    }

    fn warn(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

/// In-memory console fed from a fixed list of lines.  Everything written is
/// kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: VecDeque<String>,
    /// Prompts shown, in order.
    pub prompts: Vec<String>,
    /// Lines written to standard output.
    pub out: Vec<String>,
    /// Lines written to standard error.
    pub err: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { input: lines.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Everything written to standard output, one line per entry.
    pub fn stdout(&self) -> String {
        self.out.join("\n")
    }

    pub fn stderr(&self) -> String {
        self.err.join("\n")
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.input.pop_front())
    }

    fn say(&mut self, line: &str) {
        self.out.push(line.to_string());
    }

    fn warn(&mut self, line: &str) {
        self.err.push(line.to_string());
    }
}
