//! Typed handler adapter.
//!
//! Lets a handler declare a parameter struct instead of picking values out of
//! the raw [`Params`] map. Keys map to fields through serde, so
//! `#[serde(rename = ..)]` and `#[serde(alias = ..)]` control the mapping and
//! unknown keys are ignored.

use std::fmt::Display;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;
use crate::tool::{Params, ToolHandler};

/// Decode `params` into `P`, call `f`, and serialize its result.
///
/// A decode failure is [`ToolError::Decode`] and aborts the call; an error
/// returned by `f` becomes [`ToolError::Execution`] and is shown to the model.
pub fn execute_typed<P, R, E, F>(f: &F, params: Params) -> Result<Value, ToolError>
where
    P: DeserializeOwned,
    R: Serialize,
    E: Display,
    F: Fn(P) -> Result<R, E>,
{
    let typed: P = serde_json::from_value(Value::Object(params))
        .map_err(|e| ToolError::Decode(e.to_string()))?;
    let result = f(typed).map_err(ToolError::execution)?;
    serde_json::to_value(result).map_err(|e| ToolError::execution(format!("unserializable result: {e}")))
}

/// A [`ToolHandler`] wrapping a strongly-typed business function.
pub struct TypedHandler<P, R, E, F> {
    f: F,
    _marker: PhantomData<fn(P) -> Result<R, E>>,
}

impl<P, R, E, F> TypedHandler<P, R, E, F>
where
    P: DeserializeOwned,
    R: Serialize,
    E: Display,
    F: Fn(P) -> Result<R, E> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<P, R, E, F> ToolHandler for TypedHandler<P, R, E, F>
where
    P: DeserializeOwned,
    R: Serialize,
    E: Display,
    F: Fn(P) -> Result<R, E> + Send + Sync,
{
    async fn execute(&self, params: Params) -> Result<Value, ToolError> {
        execute_typed(&self.f, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct SqrtParams {
        x: f64,
    }

    fn sqrt(p: SqrtParams) -> Result<f64, String> {
        if p.x < 0.0 {
            return Err(format!("cannot take the square root of {}", p.x));
        }
        Ok(p.x.sqrt())
    }

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn decodes_and_calls() {
        let handler = TypedHandler::new(sqrt);
        let result = handler.execute(params(json!({"x": 9}))).await.unwrap();
        assert_eq!(result.as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn decode_failure_is_fatal() {
        let handler = TypedHandler::new(sqrt);
        let err = handler.execute(params(json!({"x": "nine"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Decode(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn missing_field_is_decode_error() {
        let handler = TypedHandler::new(sqrt);
        let err = handler.execute(Params::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Decode(ref m) if m.contains("x")));
    }

    #[tokio::test]
    async fn business_error_is_recoverable() {
        let handler = TypedHandler::new(sqrt);
        let err = handler.execute(params(json!({"x": -4}))).await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("-4"));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let result = execute_typed(&sqrt, params(json!({"x": 16, "unit": "m"}))).unwrap();
        assert_eq!(result.as_f64(), Some(4.0));
    }

    #[test]
    fn aliases_customise_key_mapping() {
        #[derive(Deserialize)]
        struct Named {
            #[serde(alias = "Name", alias = "NAME")]
            name: String,
        }
        let greet = |p: Named| Ok::<_, String>(format!("hello {}", p.name));
        let result = execute_typed(&greet, params(json!({"Name": "Ada"}))).unwrap();
        assert_eq!(result, json!("hello Ada"));
    }
}
