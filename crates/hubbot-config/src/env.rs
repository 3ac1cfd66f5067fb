// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Required startup values taken from the process environment.

use thiserror::Error;

use crate::Config;

/// Identity the broker authorizes tool calls for.
pub const USER_ID_ENV: &str = "ARCADE_USER_ID";
/// Model identifier forwarded to the model provider.
pub const MODEL_ENV: &str = "OPENAI_MODEL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {var}. Add it to your environment or .env file.")]
    MissingEnv { var: &'static str },
}

impl Config {
    /// Fill the required values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Fill the required values through `lookup`.
    ///
    /// Both values are mandatory and an empty value counts as missing.  The
    /// config is left untouched when either is absent.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv { var })
        };
        let user_id = required(USER_ID_ENV)?;
        let model = required(MODEL_ENV)?;
        self.arcade.user_id = user_id;
        self.model.name = model;
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
