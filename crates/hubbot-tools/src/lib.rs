// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod arcade;
mod arcade_tool;
mod broker;
mod descriptor;
mod policy;
mod provision;
mod registry;
mod tool;

pub use arcade::ArcadeClient;
pub use arcade_tool::ArcadeTool;
pub use broker::{
    AuthWaiter, AuthorizationResponse, AuthorizationStatus, BrokerError, ExecuteError,
    ExecuteOutput, ExecuteResponse, ToolBroker, ToolDefinition, ToolInput, ToolPage,
    ToolParameter, ToolRequirements, ToolkitRef, ValueSchema, AUTH_STATUS_WAIT_SECS,
};
pub use descriptor::{model_safe_name, parameters_schema, ToolDescriptor};
pub use policy::{ApprovalPolicy, ToolPolicy};
pub use provision::{provision, ProvisionRequest, ToolCatalog};
pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{Tool, ToolCall, ToolOutput};
