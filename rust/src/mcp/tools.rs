//! Tool definitions and handlers.
//!
//! Each handler returns the operation's JSON result, or the error the
//! operation raised.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::batch::{
    batch_analyze, batch_validate, check_collisions, generate_statistics, inputs_from_value,
};
use crate::job::{JobConfig, JobError, Operation, run_job};
use crate::parse::{FormatOptions, analyze_uuid, convert_format, uuid_version, validate_uuid};

use super::protocol::ToolDefinition;

/// Parameters for single-UUID tools
#[derive(Debug, Deserialize)]
pub struct UuidParams {
    #[serde(default)]
    pub uuid: String,
}

/// Parameters for `convert_uuid`
#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    #[serde(default)]
    pub uuid: String,
    #[serde(flatten)]
    pub format: FormatOptions,
}

/// Parameters for list tools. `uuids` is checked to be a list by the handler.
#[derive(Debug, Deserialize)]
pub struct BatchParams {
    #[serde(default)]
    pub uuids: Value,
}

fn handle_generate(args: Value) -> Result<Value, JobError> {
    let mut config: JobConfig = serde_json::from_value(args)?;
    config.operation = Operation::Generate;
    Ok(run_job(&config)?.report)
}

fn handle_validate(args: Value) -> Result<Value, JobError> {
    let p: UuidParams = serde_json::from_value(args)?;
    let valid = validate_uuid(&p.uuid)?;
    Ok(json!({ "uuid": p.uuid, "valid": valid, "version": uuid_version(&p.uuid) }))
}

fn handle_analyze(args: Value) -> Result<Value, JobError> {
    let p: UuidParams = serde_json::from_value(args)?;
    Ok(serde_json::to_value(analyze_uuid(&p.uuid)?)?)
}

fn handle_convert(args: Value) -> Result<Value, JobError> {
    let p: ConvertParams = serde_json::from_value(args)?;
    let converted = convert_format(&p.uuid, p.format)?;
    Ok(json!({ "original": p.uuid, "converted": converted }))
}

fn batch_args(args: Value) -> Result<Vec<String>, JobError> {
    let p: BatchParams = serde_json::from_value(args)?;
    Ok(inputs_from_value(&p.uuids)?)
}

fn handle_batch_validate(args: Value) -> Result<Value, JobError> {
    Ok(serde_json::to_value(batch_validate(&batch_args(args)?)?)?)
}

fn handle_batch_analyze(args: Value) -> Result<Value, JobError> {
    Ok(serde_json::to_value(batch_analyze(&batch_args(args)?)?)?)
}

fn handle_collisions(args: Value) -> Result<Value, JobError> {
    Ok(serde_json::to_value(check_collisions(&batch_args(args)?)?)?)
}

fn handle_statistics(args: Value) -> Result<Value, JobError> {
    Ok(serde_json::to_value(generate_statistics(&batch_args(args)?)?)?)
}

/// Run a tool by name. `None` when no such tool exists.
pub fn call(name: &str, args: Value) -> Option<Result<Value, JobError>> {
    let handler: fn(Value) -> Result<Value, JobError> = match name {
        "generate_uuid" => handle_generate,
        "validate_uuid" => handle_validate,
        "analyze_uuid" => handle_analyze,
        "convert_uuid" => handle_convert,
        "batch_validate" => handle_batch_validate,
        "batch_analyze" => handle_batch_analyze,
        "check_collisions" => handle_collisions,
        "uuid_statistics" => handle_statistics,
        _ => return None,
    };
    Some(handler(args))
}

fn uuid_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "uuid": {"type": "string", "description": description}
        },
        "required": ["uuid"]
    })
}

fn list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "uuids": {
                "type": "array",
                "description": "UUID strings, or objects with an `identifier` field",
                "items": {
                    "oneOf": [
                        {"type": "string"},
                        {"type": "object", "properties": {"identifier": {"type": "string"}}}
                    ]
                }
            }
        },
        "required": ["uuids"]
    })
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Definitions for the `tools/list` response.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "generate_uuid",
            "Generate one or more UUIDs (v1 time-based, v4 random, v5 namespace/name)",
            json!({
                "type": "object",
                "properties": {
                    "version": {"type": "integer", "enum": [1, 4, 5], "default": 4},
                    "count": {"type": "integer", "minimum": 1, "maximum": 100000, "default": 1},
                    "namespace": {
                        "type": "string",
                        "description": "DNS, URL, OID, X500 or a UUID (v5 only)",
                        "default": "DNS"
                    },
                    "name": {"type": "string", "description": "Name to hash (required for v5)"},
                    "uppercase": {"type": "boolean", "default": false},
                    "remove_dashes": {"type": "boolean", "default": false}
                }
            }),
        ),
        tool(
            "validate_uuid",
            "Check whether a string is a valid UUID and report its version",
            uuid_schema("UUID to validate"),
        ),
        tool(
            "analyze_uuid",
            "Report version, variant, input format and embedded v1 timestamp of a UUID",
            uuid_schema("UUID to analyze"),
        ),
        tool(
            "convert_uuid",
            "Reformat a UUID: upper/lower case, with or without dashes",
            json!({
                "type": "object",
                "properties": {
                    "uuid": {"type": "string", "description": "UUID to convert"},
                    "uppercase": {"type": "boolean", "default": false},
                    "remove_dashes": {"type": "boolean", "default": false}
                },
                "required": ["uuid"]
            }),
        ),
        tool(
            "batch_validate",
            "Validate a list of UUIDs, preserving order",
            list_schema(),
        ),
        tool(
            "batch_analyze",
            "Analyze a list of UUIDs with a version histogram",
            list_schema(),
        ),
        tool(
            "check_collisions",
            "Find repeated UUIDs in a list, ignoring case and dashes",
            list_schema(),
        ),
        tool(
            "uuid_statistics",
            "Version, format and variant histograms for a list of UUIDs",
            list_schema(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::UuidError;

    #[test]
    fn test_every_definition_has_a_handler() {
        for def in definitions() {
            assert!(call(&def.name, json!({})).is_some(), "{}", def.name);
        }
        assert!(call("nope", json!({})).is_none());
    }

    #[test]
    fn test_convert_params_flatten() {
        let p: ConvertParams =
            serde_json::from_value(json!({"uuid": "x", "uppercase": true})).unwrap();
        assert!(p.format.uppercase);
        assert!(!p.format.remove_dashes);
    }

    #[test]
    fn test_missing_uuid_raises() {
        assert!(matches!(
            call("analyze_uuid", json!({})),
            Some(Err(JobError::Uuid(UuidError::MissingInput)))
        ));
        assert!(matches!(
            call("batch_validate", json!({"uuids": "x"})),
            Some(Err(JobError::Uuid(UuidError::NotAList)))
        ));
    }
}
