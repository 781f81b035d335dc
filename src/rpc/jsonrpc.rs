/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! JSON-RPC 2.0 object definitions
use std::collections::HashMap;

use rand::{rngs::OsRng, Rng};
use tinyjson::JsonValue;

use crate::{error::RpcError, Result};

/// JSON-RPC error codes.
/// The error codes `[-32768, -32000]` are reserved for predefined errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist / is not available.
    MethodNotFound,
    /// Invalid method parameter(s).
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// EVM execution reverted (`eth_call`, `eth_estimateGas`)
    ExecutionReverted,
    /// FHE service: caller has no permission over the ciphertext
    PermissionDenied,
    /// FHE service: value type or width is not supported
    UnsupportedType,
    /// FHE service: client was not initialized for the network
    NotInitialized,
    /// Reserved for implementation-defined server-errors.
    ServerError(i32),
}

impl ErrorCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            3 => Self::ExecutionReverted,
            -32010 => Self::PermissionDenied,
            -32011 => Self::UnsupportedType,
            -32012 => Self::NotInitialized,
            c => Self::ServerError(c),
        }
    }
}

/// Wrapping enum around the JSON-RPC object types a client can receive
#[derive(Clone, Debug)]
pub enum JsonResult {
    Response(JsonResponse),
    Error(JsonError),
}

impl JsonResult {
    pub fn try_from_value(value: &JsonValue) -> Result<Self> {
        if let Ok(response) = JsonResponse::try_from(value) {
            return Ok(Self::Response(response))
        }

        if let Ok(error) = JsonError::try_from(value) {
            return Ok(Self::Error(error))
        }

        Err(RpcError::InvalidJson("Invalid JSON Result".to_string()).into())
    }
}

/// A JSON-RPC request object
#[derive(Clone, Debug)]
pub struct JsonRequest {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Request ID
    pub id: u16,
    /// Request method
    pub method: String,
    /// Request parameters
    pub params: JsonValue,
}

impl JsonRequest {
    /// Create a new [`JsonRequest`] object with the given method and parameters.
    /// The request ID is chosen randomly.
    pub fn new(method: &str, params: JsonValue) -> Self {
        assert!(params.is_object() || params.is_array());
        Self { jsonrpc: "2.0", id: OsRng.gen(), method: method.to_string(), params }
    }

    /// Convert the object into a JSON string
    pub fn stringify(&self) -> Result<String> {
        let v: JsonValue = self.into();
        Ok(v.stringify()?)
    }
}

impl From<&JsonRequest> for JsonValue {
    fn from(req: &JsonRequest) -> JsonValue {
        JsonValue::Object(HashMap::from([
            ("jsonrpc".to_string(), JsonValue::String(req.jsonrpc.to_string())),
            ("id".to_string(), JsonValue::Number(req.id.into())),
            ("method".to_string(), JsonValue::String(req.method.clone())),
            ("params".to_string(), req.params.clone()),
        ]))
    }
}

/// A JSON-RPC response object
#[derive(Clone, Debug)]
pub struct JsonResponse {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Request ID
    pub id: u16,
    /// Response result
    pub result: JsonValue,
}

impl TryFrom<&JsonValue> for JsonResponse {
    type Error = RpcError;

    fn try_from(value: &JsonValue) -> std::result::Result<Self, Self::Error> {
        let Some(map) = value.get::<HashMap<String, JsonValue>>() else {
            return Err(RpcError::InvalidJson("Json is not an Object".to_string()))
        };

        check_version(map, "Response")?;

        let Some(id) = map.get("id").and_then(|v| v.get::<f64>()) else {
            return Err(RpcError::InvalidJson(
                "Response does not contain valid \"id\" field".to_string(),
            ))
        };

        let Some(result) = map.get("result") else {
            return Err(RpcError::InvalidJson(
                "Response does not contain valid \"result\" field".to_string(),
            ))
        };

        Ok(Self { jsonrpc: "2.0", id: *id as u16, result: result.clone() })
    }
}

/// A JSON-RPC error object
#[derive(Clone, Debug)]
pub struct JsonError {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Request ID
    pub id: u16,
    /// JSON-RPC error (code and message)
    pub error: JsonErrorVal,
}

/// A JSON-RPC error value (code and message)
#[derive(Clone, Debug)]
pub struct JsonErrorVal {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
}

impl TryFrom<&JsonValue> for JsonError {
    type Error = RpcError;

    fn try_from(value: &JsonValue) -> std::result::Result<Self, Self::Error> {
        let Some(map) = value.get::<HashMap<String, JsonValue>>() else {
            return Err(RpcError::InvalidJson("JSON is not an Object".to_string()))
        };

        check_version(map, "Error")?;

        // Nodes answer unparseable requests with a null ID
        let id = map.get("id").and_then(|v| v.get::<f64>()).map(|v| *v as u16).unwrap_or(0);

        let Some(error) = map.get("error").and_then(|v| v.get::<HashMap<String, JsonValue>>())
        else {
            return Err(RpcError::InvalidJson(
                "Error does not contain valid \"error\" field".to_string(),
            ))
        };

        let Some(code) = error.get("code").and_then(|v| v.get::<f64>()) else {
            return Err(RpcError::InvalidJson(
                "Error does not contain valid \"error.code\" field".to_string(),
            ))
        };

        let Some(message) = error.get("message").and_then(|v| v.get::<String>()) else {
            return Err(RpcError::InvalidJson(
                "Error does not contain valid \"error.message\" field".to_string(),
            ))
        };

        Ok(Self {
            jsonrpc: "2.0",
            id,
            error: JsonErrorVal { code: *code as i32, message: message.clone() },
        })
    }
}

fn check_version(
    map: &HashMap<String, JsonValue>,
    kind: &str,
) -> std::result::Result<(), RpcError> {
    match map.get("jsonrpc").and_then(|v| v.get::<String>()) {
        Some(v) if v == "2.0" => Ok(()),
        _ => Err(RpcError::InvalidJson(format!(
            "{kind} does not contain valid \"jsonrpc\" field"
        ))),
    }
}
