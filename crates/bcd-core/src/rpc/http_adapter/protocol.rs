use serde_json::{Map, Value};

use crate::error::{CoreError, RpcError};

/// JSON-RPC request dialect.
///
/// `V2` sends parameters by name as a JSON object. `V1` is the legacy
/// dialect: the same parameters flattened to a positional array, for nodes
/// that predate named-parameter support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcProtocol {
    V1,
    #[default]
    V2,
}

impl JsonRpcProtocol {
    pub fn version(self) -> &'static str {
        match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
        }
    }

    /// Build the request body. `params` are given in positional order.
    pub(super) fn encode_request(
        self,
        id: u64,
        method: &str,
        params: &[(&'static str, Value)],
    ) -> Value {
        let params = match self {
            Self::V1 => Value::Array(params.iter().map(|(_, value)| value.clone()).collect()),
            Self::V2 => Value::Object(
                params
                    .iter()
                    .map(|(name, value)| ((*name).to_owned(), value.clone()))
                    .collect::<Map<_, _>>(),
            ),
        };
        serde_json::json!({
            "jsonrpc": self.version(),
            "id": id,
            "method": method,
            "params": params,
        })
    }
}

#[derive(serde::Deserialize)]
pub(super) struct JsonRpcResponse {
    pub(super) result: Option<Value>,
    pub(super) error: Option<Value>,
}

/// Parse a JSON-RPC error value into a structured `CoreError`.
///
/// Errors shaped like `{"code": <int>, "message": <string>}` become
/// `ServerError`; anything else falls back to `InvalidResponse` with the raw
/// JSON.
pub(super) fn parse_jsonrpc_error(err: Value) -> CoreError {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    if let Ok(parsed) = serde_json::from_value::<JsonRpcError>(err.clone()) {
        CoreError::Rpc(RpcError::ServerError {
            code: parsed.code,
            message: parsed.message,
        })
    } else {
        CoreError::Rpc(RpcError::InvalidResponse(format!(
            "non-standard JSON-RPC error: {err}"
        )))
    }
}
