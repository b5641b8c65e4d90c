//! Common error types used across all Eco Chart crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for Eco Chart operations
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EcoChartError {
    // Rendering engine errors
    #[error("Engine initialization failed: {message}")]
    EngineInit { message: String },

    #[error("Engine call '{operation}' failed: {message}")]
    EngineCall { operation: String, message: String },

    // Payload errors
    #[error("Payload field '{field}' could not be parsed: {message}")]
    PayloadParse { field: String, message: String },

    #[error("Update shape {actual} does not match the {expected} contract")]
    ContractMismatch { expected: String, actual: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid projection parameters: {message}")]
    InvalidProjection { message: String },

    // WASM-specific errors
    #[error("JavaScript interop error: {message}")]
    JsInterop { message: String },
}

/// Result type alias for Eco Chart operations
pub type EcoChartResult<T> = Result<T, EcoChartError>;

impl EcoChartError {
    pub fn engine_call(operation: &str, message: impl Into<String>) -> Self {
        EcoChartError::EngineCall {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Serialize for JavaScript callers
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"JsInterop","details":{"message":"Failed to serialize error"}}"#.to_string()
        })
    }
}

impl From<serde_json::Error> for EcoChartError {
    fn from(err: serde_json::Error) -> Self {
        EcoChartError::PayloadParse {
            field: format!("line {}", err.line()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = EcoChartError::engine_call("setOption", "container detached");
        let json = error.to_json();
        assert!(json.contains("EngineCall"));
        assert!(json.contains("container detached"));
    }

    #[test]
    fn test_error_conversion() {
        let parse_err = serde_json::from_str::<Vec<f64>>("[1,").unwrap_err();
        let err: EcoChartError = parse_err.into();

        match err {
            EcoChartError::PayloadParse { message, .. } => assert!(!message.is_empty()),
            _ => panic!("Wrong error variant"),
        }
    }
}
