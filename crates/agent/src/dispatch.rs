//! Tool call dispatch: resolve, decode, run, and encode the result.

use gena_core::error::ToolError;
use gena_core::tool::{Params, ToolRegistry};
use serde_json::Value;
use tracing::{debug, warn};

/// Run one requested call and return the JSON text to send back to the model.
///
/// Handler business errors and a missing handler become the string
/// `"error: <message>"`. Every other failure is returned to the caller.
pub async fn dispatch(
    tools: &ToolRegistry,
    name: &str,
    arguments: &str,
) -> Result<String, ToolError> {
    let tool = tools
        .get(name)
        .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
    let params = parse_arguments(arguments)?;

    debug!(tool = name, arguments, "Dispatching tool call");

    let value = match tool.run(params).await {
        Ok(value) => value,
        Err(e) if e.is_recoverable() => {
            warn!(tool = name, error = %e, "Tool handler failed");
            error_value(&e)
        }
        Err(e) => return Err(e),
    };

    let content = encode_result(value)?;
    debug!(tool = name, result = %content, "Tool call finished");
    Ok(content)
}

/// The value reported to the model in place of a failed call's result.
pub fn error_value(err: &ToolError) -> Value {
    Value::String(format!("error: {err}"))
}

/// Decode a call's argument text. Blank text means no arguments.
pub fn parse_arguments(arguments: &str) -> Result<Params, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(Params::new());
    }
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::InvalidArguments(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(ToolError::InvalidArguments(e.to_string())),
    }
}

/// Serialize a result to JSON text, writing integral floats as integers.
pub fn encode_result(value: Value) -> Result<String, ToolError> {
    serde_json::to_string(&normalize_numbers(value))
        .map_err(|e| ToolError::Execution(format!("result is not serializable: {e}")))
}

fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gena_core::tool::Tool;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools
            .register(Tool::new("echo").with_handler_fn(|p| Ok(Value::Object(p))))
            .unwrap();
        tools
            .register(
                Tool::new("flaky").with_handler_fn(|_| Err(ToolError::execution("disk full"))),
            )
            .unwrap();
        tools.register(Tool::new("hollow")).unwrap();
        tools
    }

    #[test]
    fn blank_arguments_are_empty_params() {
        assert!(parse_arguments("").unwrap().is_empty());
        assert!(parse_arguments("  \n").unwrap().is_empty());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(matches!(
            parse_arguments("[1,2]"),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            parse_arguments("{not json"),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn integral_floats_lose_their_fraction() {
        assert_eq!(encode_result(json!(3.0)).unwrap(), "3");
        assert_eq!(encode_result(json!(2.5)).unwrap(), "2.5");
        assert_eq!(encode_result(json!({"v": [1.0, -4.0]})).unwrap(), r#"{"v":[1,-4]}"#);
        assert_eq!(encode_result(json!("noon")).unwrap(), "\"noon\"");
    }

    #[tokio::test]
    async fn dispatch_runs_the_named_tool() {
        let out = dispatch(&registry(), "echo", r#"{"a":1}"#).await.unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn handler_errors_become_results() {
        let out = dispatch(&registry(), "flaky", "{}").await.unwrap();
        assert_eq!(out, "\"error: disk full\"");
    }

    #[tokio::test]
    async fn unknown_tool_is_fatal() {
        let err = dispatch(&registry(), "missing", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "missing"));
    }

    #[tokio::test]
    async fn tool_without_handler_reports_an_error_result() {
        let out = dispatch(&registry(), "hollow", "").await.unwrap();
        assert_eq!(out, "\"error: No handler defined for tool: hollow\"");
    }
}
