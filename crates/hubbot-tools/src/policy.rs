// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use hubbot_config::ToolsConfig;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Per-tool approval policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// Always run without asking
    Auto,
    /// Ask user before each invocation
    Ask,
    /// Never run; return an error
    Deny,
}

/// Policy engine that maps a tool name to an approval decision.
#[derive(Debug)]
pub struct ToolPolicy {
    approval_patterns: Vec<Regex>,
    deny_patterns: Vec<Regex>,
}

impl ToolPolicy {
    pub fn from_config(cfg: &ToolsConfig) -> Self {
        let compile = |patterns: &[String]| -> Vec<Regex> {
            patterns
                .iter()
                .filter_map(|p| {
                    let re = glob_to_regex(p);
                    if re.is_none() {
                        warn!(pattern = %p, "ignoring invalid tool pattern");
                    }
                    re
                })
                .collect()
        };
        Self {
            approval_patterns: compile(&cfg.approval_patterns),
            deny_patterns: compile(&cfg.deny_patterns),
        }
    }

    /// Decide whether a call of `tool_name` runs directly, waits for the
    /// user's approval, or is refused.  Deny wins over approval.
    pub fn decide(&self, tool_name: &str) -> ApprovalPolicy {
        if self.deny_patterns.iter().any(|re| re.is_match(tool_name)) {
            return ApprovalPolicy::Deny;
        }
        if self.approval_patterns.iter().any(|re| re.is_match(tool_name)) {
            return ApprovalPolicy::Ask;
        }
        ApprovalPolicy::Auto
    }
}

/// Convert a simple shell glob pattern to a [`Regex`].
/// Only `*` (match anything) and `?` (match one char) are supported.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_with(approve: &[&str], deny: &[&str]) -> ToolPolicy {
        ToolPolicy::from_config(&ToolsConfig {
            approval_patterns: approve.iter().map(|s| s.to_string()).collect(),
            deny_patterns: deny.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn deny_beats_approval_for_same_pattern() {
        let p = policy_with(&["Github_Delete*"], &["Github_Delete*"]);
        assert_eq!(p.decide("Github_DeleteBranch"), ApprovalPolicy::Deny);
    }

    #[test]
    fn approval_wildcard_prefix() {
        let p = policy_with(&["Github_Merge*"], &[]);
        assert_eq!(p.decide("Github_MergePullRequest"), ApprovalPolicy::Ask);
    }

    #[test]
    fn unmatched_tool_runs_automatically() {
        let p = policy_with(&["Github_Merge*"], &[]);
        assert_eq!(p.decide("Github_ListIssues"), ApprovalPolicy::Auto);
    }

    #[test]
    fn question_mark_matches_one_char() {
        let p = policy_with(&["Tool?"], &[]);
        assert_eq!(p.decide("ToolA"), ApprovalPolicy::Ask);
        assert_eq!(p.decide("ToolAB"), ApprovalPolicy::Auto);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = policy_with(&["Github.Create*"], &[]);
        assert_eq!(p.decide("GithubXCreateIssue"), ApprovalPolicy::Auto);
        assert_eq!(p.decide("Github.CreateIssue"), ApprovalPolicy::Ask);
    }

    #[test]
    fn default_config_asks_before_writes_and_not_before_reads() {
        let p = ToolPolicy::from_config(&ToolsConfig::default());
        assert_eq!(p.decide("Github_CreateIssue"), ApprovalPolicy::Ask);
        assert_eq!(p.decide("Github_MergePullRequest"), ApprovalPolicy::Ask);
        assert_eq!(p.decide("Github_GetFileContents"), ApprovalPolicy::Auto);
        assert_eq!(p.decide("Github_ListPullRequests"), ApprovalPolicy::Auto);
    }
}
