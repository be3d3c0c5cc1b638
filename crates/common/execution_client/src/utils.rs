use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExecutionError;

#[derive(Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub id: i32,
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Vec<Value>) -> Self {
        Self {
            id: 1,
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// Either the `result` of a call or the raw JSON-RPC error object.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse<T> {
    Result { result: T },
    Error(Value),
}

impl<T> JsonRpcResponse<T> {
    pub fn to_result(self) -> Result<T, ExecutionError> {
        match self {
            JsonRpcResponse::Result { result } => Ok(result),
            JsonRpcResponse::Error(err) => Err(ExecutionError::RpcError(err)),
        }
    }
}
