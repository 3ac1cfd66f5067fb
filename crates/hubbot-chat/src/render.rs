// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use hubbot_model::{Message, MessageContent};

/// Human-readable form of a thread message.
pub fn format_message(msg: &Message) -> String {
    match &msg.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::ToolCall { tool_call_id, function } => {
            let args = serde_json::from_str::<serde_json::Value>(&function.arguments)
                .ok()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
                .unwrap_or_else(|| function.arguments.clone());
            format!("Tool call: {} ({tool_call_id})\n  Args: {args}", function.name)
        }
        MessageContent::ToolResult { tool_call_id, content } => {
            format!("Tool result ({tool_call_id}):\n{content}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_shown_as_is() {
        assert_eq!(format_message(&Message::assistant("hi")), "hi");
    }

    #[test]
    fn tool_call_shows_name_and_pretty_args() {
        let m = Message::tool_call("c1", "Github_ListIssues", r#"{"repo":"x"}"#);
        let s = format_message(&m);
        assert!(s.starts_with("Tool call: Github_ListIssues (c1)"));
        assert!(s.contains("\"repo\": \"x\""));
    }

    #[test]
    fn unparsable_args_are_shown_raw() {
        let m = Message::tool_call("c1", "t", "{oops");
        assert!(format_message(&m).ends_with("Args: {oops"));
    }

    #[test]
    fn tool_result_shows_id_and_content() {
        let m = Message::tool_result("c1", "3 issues");
        assert_eq!(format_message(&m), "Tool result (c1):\n3 issues");
    }
}
