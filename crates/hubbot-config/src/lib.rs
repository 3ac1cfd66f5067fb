// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod schema;
mod loader;
mod env;
mod prompt;

pub use schema::*;
pub use loader::load;
pub use env::{ConfigError, MODEL_ENV, USER_ID_ENV};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
