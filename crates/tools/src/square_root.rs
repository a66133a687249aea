//! Square root tool, built on the typed handler adapter.

use gena_core::handler::TypedHandler;
use gena_core::tool::Tool;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SquareRootParams {
    #[serde(alias = "X")]
    pub x: f64,
}

pub fn square_root(params: SquareRootParams) -> Result<f64, String> {
    if params.x < 0.0 {
        return Err(format!("cannot take the square root of {}", params.x));
    }
    Ok(params.x.sqrt())
}

pub fn tool() -> Tool {
    Tool::new("square_root")
        .with_description("Calculates the square root of a number")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "x": {
                    "type": "number",
                    "description": "The number to take the square root of"
                }
            },
            "required": ["x"]
        }))
        .with_handler(TypedHandler::new(square_root))
}
