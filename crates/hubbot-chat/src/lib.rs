// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod console;
pub mod render;
pub mod resolver;
pub mod session;
pub mod startup;

pub use console::{Console, ScriptedConsole, StdConsole};
pub use resolver::InterruptResolver;
pub use session::ChatSession;
pub use startup::{prepare, Prepared};
