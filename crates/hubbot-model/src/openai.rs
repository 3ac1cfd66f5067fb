// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! OpenAI chat-completions driver.
//!
//! Speaks the `/chat/completions` SSE streaming wire format, so it also works
//! against OpenAI-compatible gateways configured through `model.base_url`.

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use crate::{provider::ResponseStream, CompletionRequest, MessageContent, ResponseEvent, Role};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions driver.
pub struct OpenAiProvider {
    model: String,
    /// API key (pre-resolved from config or env).
    api_key: Option<String>,
    /// Full chat completions URL, e.g. `https://api.openai.com/v1/chat/completions`.
    chat_url: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// - `base_url`: API base that ends **before** `/chat/completions`;
    ///   `None` selects the public OpenAI endpoint
    /// - `max_tokens`: `None` uses 4096
    /// - `temperature`: `None` defaults to 0.2
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Self {
        let base = base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            model,
            api_key,
            chat_url: format!("{base}/chat/completions"),
            max_tokens: max_tokens.unwrap_or(4096),
            temperature: temperature.unwrap_or(0.2),
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, req: &CompletionRequest) -> Value {
        let messages = build_openai_messages(&req.messages);
        let tools: Vec<Value> = req.tools.iter().map(|t| json!({
            "type": "function",
            "function": {
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
            }
        })).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": req.stream,
            "max_completion_tokens": self.max_tokens,
            "stream_options": { "include_usage": true },
        });
        // Reasoning models reject an explicit temperature.
        if !(self.model.starts_with("o1") || self.model.starts_with("o3") || self.model.starts_with("gpt-5")) {
            body["temperature"] = json!(self.temperature);
        }
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }
        body
    }
}

#[async_trait]
impl crate::ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let body = self.request_body(&req);

        debug!(
            model = %self.model,
            tool_count = req.tools.len(),
            message_count = req.messages.len(),
            "sending completion request"
        );
        tracing::trace!(request_body = ?body, "full completion request");

        let key = self.api_key.as_deref()
            .context("API key not set; provide api_key or api_key_env in config")?;
        let resp = self.client.post(&self.chat_url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("openai error {status}: {text}");
        }

        // SSE events can be split across multiple TCP packets, even inside a
        // multibyte character.  Bytes are buffered across chunks and only
        // complete lines are decoded.
        let event_stream = resp.bytes_stream()
            .scan(Vec::new(), |buf: &mut Vec<u8>, chunk| {
                let events: Vec<anyhow::Result<ResponseEvent>> = match chunk {
                    Ok(b) => {
                        buf.extend_from_slice(&b);
                        drain_complete_sse_lines(buf)
                    }
                    Err(e) => vec![Err(anyhow::anyhow!(e))],
                };
                std::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(event_stream))
    }
}

/// Parse a single complete SSE `data:` line into [`ResponseEvent`]s.
///
/// Empty lines, comment lines and unparseable data yield nothing.
fn parse_sse_data_line(line: &str) -> Vec<anyhow::Result<ResponseEvent>> {
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return Vec::new();
    };
    if data.is_empty() {
        return Vec::new();
    }
    if data == "[DONE]" {
        return vec![Ok(ResponseEvent::Done)];
    }
    match serde_json::from_str::<Value>(data) {
        Ok(v) => parse_sse_chunk(&v).into_iter().map(Ok).collect(),
        Err(e) => {
            debug!("skipping unparseable SSE data: {e}");
            Vec::new()
        }
    }
}

/// Drain all complete `\n`-terminated SSE lines from `buf`.
///
/// Any trailing incomplete line, including a partial UTF-8 sequence, is left
/// in `buf` so it can be extended by the next TCP chunk.
pub(crate) fn drain_complete_sse_lines(buf: &mut Vec<u8>) -> Vec<anyhow::Result<ResponseEvent>> {
    let mut events = Vec::new();
    while let Some(nl_pos) = buf.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buf.drain(..=nl_pos).collect();
        let line = match std::str::from_utf8(&raw[..nl_pos]) {
            Ok(line) => line,
            Err(e) => {
                events.push(Err(anyhow::anyhow!("invalid UTF-8 in SSE stream: {e}")));
                continue;
            }
        };
        events.extend(parse_sse_data_line(line.trim_end_matches('\r')));
    }
    events
}

fn role_str(r: Role) -> &'static str {
    match r {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn parse_sse_chunk(v: &Value) -> Vec<ResponseEvent> {
    if let Some(err) = v.get("error").filter(|e| !e.is_null()) {
        let msg = err["message"].as_str().unwrap_or("unknown stream error");
        return vec![ResponseEvent::Error(msg.to_string())];
    }

    // Usage-only chunk (emitted when stream_options.include_usage = true)
    if let Some(usage) = v.get("usage").filter(|u| !u.is_null()) {
        return vec![ResponseEvent::Usage {
            input_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
        }];
    }

    let delta = &v["choices"][0]["delta"];

    // Some gateways pack several parallel calls into one delta; each
    // element's own index routes accumulation in the agent.
    if let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) {
        return calls
            .iter()
            .enumerate()
            .map(|(pos, tc)| ResponseEvent::ToolCall {
                index: tc["index"].as_u64().unwrap_or(pos as u64) as u32,
                id: tc["id"].as_str().unwrap_or("").to_string(),
                name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                arguments: tc["function"]["arguments"].as_str().unwrap_or("").to_string(),
            })
            .collect();
    }

    if let Some(text) = delta.get("content").and_then(|c| c.as_str()) {
        return vec![ResponseEvent::TextDelta(text.to_string())];
    }

    Vec::new()
}

/// Convert a slice of [`Message`](crate::Message)s into the OpenAI wire-format
/// JSON array.
///
/// Consecutive `ToolCall` messages are merged into one assistant message with
/// a `tool_calls` array, which is how OpenAI expects parallel calls.
pub(crate) fn build_openai_messages(messages: &[crate::Message]) -> Vec<Value> {
    fn tool_call_to_json(tool_call_id: &str, function: &crate::FunctionCall) -> Value {
        json!({
            "id": tool_call_id,
            "type": "function",
            "function": {
                "name": function.name,
                "arguments": function.arguments,
            }
        })
    }

    let mut result: Vec<Value> = Vec::with_capacity(messages.len());
    let mut iter = messages.iter().peekable();

    while let Some(m) = iter.next() {
        let v = match &m.content {
            MessageContent::ToolCall { tool_call_id, function } => {
                let mut calls = vec![tool_call_to_json(tool_call_id, function)];
                while let Some(next) =
                    iter.next_if(|n| matches!(n.content, MessageContent::ToolCall { .. }))
                {
                    if let MessageContent::ToolCall { tool_call_id, function } = &next.content {
                        calls.push(tool_call_to_json(tool_call_id, function));
                    }
                }
                json!({ "role": "assistant", "tool_calls": calls })
            }
            MessageContent::Text(t) => json!({
                "role": role_str(m.role),
                "content": t,
            }),
            MessageContent::ToolResult { tool_call_id, content } => {
                json!({ "role": "tool", "tool_call_id": tool_call_id, "content": content })
            }
        };
        result.push(v);
    }

    result
}
