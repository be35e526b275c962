// crates/v2x-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the v2x-daemon HTTP endpoint.
//
// Reuses the server's envelope types so the wire format cannot drift.

use serde::de::DeserializeOwned;
use serde::Serialize;

use v2x_rpc::{JsonRpcRequest, JsonRpcResponse};

/// Errors surfaced by the CLI when talking to the daemon.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("daemon rejected {method} ({kind}): {message}")]
    Rejected {
        method: String,
        kind: String,
        message: String,
    },

    #[error("malformed response to {method}: {message}")]
    Malformed { method: String, message: String },
}

/// Thin client bound to a single daemon endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a JSON-RPC call and return the raw envelope.
    pub async fn raw_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse, CliError> {
        let request = JsonRpcRequest {
            method: method.to_string(),
            params,
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    /// Send a typed request and decode the typed result.
    pub async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, CliError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let params = serde_json::to_value(request).map_err(|e| CliError::Malformed {
            method: method.to_string(),
            message: e.to_string(),
        })?;
        let response = self.raw_call(method, params).await?;
        decode_response(method, response)
    }
}

/// Unwrap an envelope into its typed result or a `CliError::Rejected`.
pub fn decode_response<Resp: DeserializeOwned>(
    method: &str,
    response: JsonRpcResponse,
) -> Result<Resp, CliError> {
    if !response.success {
        return Err(CliError::Rejected {
            method: method.to_string(),
            kind: response.kind.unwrap_or_else(|| "unknown".to_string()),
            message: response.error.unwrap_or_default(),
        });
    }
    let result = response.result.ok_or_else(|| CliError::Malformed {
        method: method.to_string(),
        message: "success without a result".to_string(),
    })?;
    serde_json::from_value(result).map_err(|e| CliError::Malformed {
        method: method.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use v2x_rpc::handlers::transactions::NewTransactionResponse;

    #[test]
    fn decode_success_into_typed_result() {
        let response = JsonRpcResponse {
            success: true,
            result: Some(json!({"message": "New transaction added to block 2", "blockIndex": 2})),
            error: None,
            kind: None,
        };
        let decoded: NewTransactionResponse =
            decode_response("transactions/new", response).unwrap();
        assert_eq!(decoded.block_index, 2);
    }

    #[test]
    fn decode_failure_carries_kind() {
        let response = JsonRpcResponse {
            success: false,
            result: None,
            error: Some("duplicate".to_string()),
            kind: Some("duplicate_transaction".to_string()),
        };
        let err = decode_response::<NewTransactionResponse>("transactions/new", response)
            .unwrap_err();
        match err {
            CliError::Rejected { kind, method, .. } => {
                assert_eq!(kind, "duplicate_transaction");
                assert_eq!(method, "transactions/new");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_success_without_result_is_malformed() {
        let response = JsonRpcResponse {
            success: true,
            result: None,
            error: None,
            kind: None,
        };
        assert!(matches!(
            decode_response::<NewTransactionResponse>("transactions/new", response),
            Err(CliError::Malformed { .. })
        ));
    }

    #[test]
    fn client_keeps_endpoint() {
        let client = RpcClient::new("http://127.0.0.1:50061");
        assert_eq!(client.endpoint(), "http://127.0.0.1:50061");
    }
}
