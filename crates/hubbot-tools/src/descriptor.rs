// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::broker::{ToolDefinition, ToolParameter, ValueSchema};

/// A provisioned tool as the rest of the system sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    /// Model-facing name, e.g. `Github_CreateIssue`.
    pub name: String,
    /// Broker-facing name, e.g. `Github.CreateIssue`.
    pub qualified_name: String,
    pub toolkit: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: Value,
    /// The broker declares a user authorization requirement.
    pub requires_auth: bool,
}

impl ToolDescriptor {
    pub fn from_definition(def: &ToolDefinition) -> Self {
        let qualified_name = if def.qualified_name.is_empty() {
            format!("{}.{}", def.toolkit.name, def.name)
        } else {
            def.qualified_name.clone()
        };
        Self {
            name: model_safe_name(&qualified_name),
            toolkit: def.toolkit.name.clone(),
            description: def.description.clone(),
            parameters: parameters_schema(&def.input.parameters),
            requires_auth: def
                .requirements
                .as_ref()
                .is_some_and(|r| r.authorization.as_ref().is_some_and(|a| !a.is_null())),
            qualified_name,
        }
    }
}

/// Function names may not contain dots, so `Github.CreateIssue` is exposed to
/// the model as `Github_CreateIssue`.
pub fn model_safe_name(qualified: &str) -> String {
    qualified.replace('.', "_")
}

/// Build an object schema from the broker's flat parameter list.
pub fn parameters_schema(params: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for p in params {
        let mut schema = value_schema(&p.value_schema);
        if let Some(desc) = p.description.as_deref().filter(|d| !d.is_empty()) {
            schema["description"] = json!(desc);
        }
        properties.insert(p.name.clone(), schema);
        if p.required {
            required.push(json!(p.name));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn json_type(val_type: &str) -> Value {
    match val_type {
        "string" | "integer" | "number" | "boolean" | "array" => json!({ "type": val_type }),
        "json" => json!({ "type": "object" }),
        // Unknown types are left unconstrained rather than rejected.
        _ => json!({}),
    }
}

fn value_schema(vs: &ValueSchema) -> Value {
    let mut schema = json_type(&vs.val_type);
    if vs.val_type == "array" {
        let inner = vs.inner_val_type.as_deref().unwrap_or("string");
        let mut items = json_type(inner);
        if let Some(values) = &vs.enum_values {
            items["enum"] = json!(values);
        }
        schema["items"] = items;
    } else if let Some(values) = &vs.enum_values {
        schema["enum"] = json!(values);
    }
    schema
}
