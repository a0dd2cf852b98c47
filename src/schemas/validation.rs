use crate::schemas::{schema::REQUIREMENT_MARKER, SchemaHandle};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use tracing::{debug, warn};

/// Check a parsed model object against a schema without rejecting it.
///
/// Returns at most `max_issues` human readable violations, each prefixed with the
/// JSON pointer of the offending value. A final `"... more issues truncated"` entry
/// marks that the list was capped.
pub fn contract_issues(schema: &SchemaHandle, payload: &Value, max_issues: usize) -> Vec<String> {
    let validator = match JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema.schema_json())
    {
        Ok(validator) => validator,
        Err(err) => {
            warn!(
                target: "tripagent::schema",
                schema = schema.schema_name(),
                error = %err,
                "schema failed to compile; skipping contract checks"
            );
            return Vec::new();
        }
    };

    let mut issues = Vec::new();
    if let Err(errors) = validator.validate(payload) {
        let mut truncated = false;
        for (idx, error) in errors.enumerate() {
            if idx >= max_issues {
                truncated = true;
                break;
            }
            let mut path = error.instance_path.to_string();
            if path.is_empty() {
                path = "<root>".to_string();
            }
            issues.push(format!("{}: {}", path, error));
        }
        if truncated {
            issues.push("... more issues truncated".to_string());
        }
    }

    if !issues.is_empty() {
        debug!(
            target: "tripagent::schema",
            schema = schema.schema_name(),
            ?issues,
            "model output breaks the response contract"
        );
    }
    issues
}

/// Append the schema instructions to the leading system message, once.
pub fn inject_schema_instructions(messages: &mut [Value], schema: &SchemaHandle) {
    let Some(system) = messages
        .first_mut()
        .filter(|message| message.get("role").and_then(Value::as_str) == Some("system"))
    else {
        return;
    };
    let Some(Value::String(content)) = system.get_mut("content") else {
        return;
    };
    if content.contains(REQUIREMENT_MARKER) {
        return;
    }

    content.push_str("\n\n");
    content.push_str(&schema.instructions());
}
