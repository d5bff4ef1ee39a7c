// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC 2.0 request and response envelopes.
//!
//! ```text
//! -> {"jsonrpc": "2.0", "method": "Handshake.Implements", "params": {}, "id": 1}
//! <- {"jsonrpc": "2.0", "result": {"X/1.0": ["a", "b"]}, "id": 1}
//! <- {"jsonrpc": "2.0", "error": {"code": -32601, "message": "..."}, "id": 1}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tether_core::CallError;

/// Protocol version carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes.
pub mod codes {
    /// Body is not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// JSON is not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// No such `Service.Method`.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Parameters rejected by the method.
    pub const INVALID_PARAMS: i64 = -32602;
    /// The method ran and failed.
    pub const SERVER_ERROR: i64 = -32000;
}

/// An inbound method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Must equal [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Fully qualified `Service.Method` name.
    pub method: String,
    /// Method parameters; absent means `null`.
    #[serde(default)]
    pub params: Value,
    /// Correlation id echoed in the response.
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    /// Build a request envelope.
    pub fn new(method: impl Into<String>, params: Value, id: impl Into<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: id.into(),
        }
    }
}

/// Error member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// One of [`codes`].
    pub code: i64,
    /// Short description.
    pub message: String,
    /// Extra detail supplied by the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// Build an error object without data.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<CallError> for RpcErrorObject {
    fn from(err: CallError) -> Self {
        let message = err.to_string();
        match err {
            CallError::MethodNotFound(_) => Self::new(codes::METHOD_NOT_FOUND, message),
            CallError::InvalidParams(_) => Self::new(codes::INVALID_PARAMS, message),
            CallError::Failed { data, .. } => Self {
                code: codes::SERVER_ERROR,
                message,
                data,
            },
        }
    }
}

/// An outbound response: exactly one of `result` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Method result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
    /// Id copied from the request, `null` when it could not be read.
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    /// Successful response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Failed response.
    pub fn failure(id: Value, error: impl Into<RpcErrorObject>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error.into()),
            id,
        }
    }
}

/// Decode a request body, producing the error response to send when it is
/// not a single well-formed request.
pub fn decode_request(body: &[u8]) -> Result<RpcRequest, RpcResponse> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        RpcResponse::failure(
            Value::Null,
            RpcErrorObject::new(codes::PARSE_ERROR, format!("parse error: {e}")),
        )
    })?;

    if value.is_array() {
        return Err(RpcResponse::failure(
            Value::Null,
            RpcErrorObject::new(codes::INVALID_REQUEST, "batch requests are not supported"),
        ));
    }

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = serde_json::from_value(value).map_err(|e| {
        RpcResponse::failure(
            id.clone(),
            RpcErrorObject::new(codes::INVALID_REQUEST, format!("invalid request: {e}")),
        )
    })?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(RpcResponse::failure(
            id,
            RpcErrorObject::new(
                codes::INVALID_REQUEST,
                format!("unsupported jsonrpc version `{}`", request.jsonrpc),
            ),
        ));
    }

    Ok(request)
}
