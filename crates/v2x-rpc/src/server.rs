// crates/v2x-rpc/src/server.rs
//
// RPC server setup: V2xRpcServer and RpcConfig.
//
// Uses a JSON-RPC-over-tonic approach. A single tonic service accepts
// JSON-encoded requests with a method field, dispatches to the appropriate
// handler, and returns JSON-encoded responses. HTTP/1 is accepted so plain
// HTTP clients can POST envelopes directly.

use std::sync::Arc;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tonic::transport::Server;
use tonic::Status;

use v2x_consensus::LedgerService;
use v2x_core::V2xError;
use v2x_reputation::TrustStore;

use crate::handlers;
use crate::middleware;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50061,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
/// The client sends a method name and a JSON params payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "transactions/new", "mine").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Error message (if not success).
    pub error: Option<String>,
    /// Machine-readable error kind (if not success), e.g. "duplicate_transaction".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl JsonRpcResponse {
    fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(value),
            error: None,
            kind: None,
        }
    }

    fn failure(err: &V2xError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// V2xRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the V2X opinion ledger.
///
/// Holds Arc references to the ledger service and (optionally) the trust
/// store, and exposes a tonic-based server with JSON-RPC dispatching.
#[derive(Clone)]
pub struct V2xRpcServer {
    config: RpcConfig,
    ledger: Arc<LedgerService>,
    trust_store: Option<Arc<RwLock<TrustStore>>>,
}

impl std::fmt::Debug for V2xRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V2xRpcServer")
            .field("config", &self.config)
            .field("trust_enabled", &self.trust_store.is_some())
            .finish()
    }
}

impl V2xRpcServer {
    /// Create a new V2xRpcServer.
    pub fn new(config: RpcConfig, ledger: Arc<LedgerService>) -> Self {
        Self {
            config,
            ledger,
            trust_store: None,
        }
    }

    /// Set the shared trust store for reputation queries.
    pub fn with_trust_store(mut self, store: Arc<RwLock<TrustStore>>) -> Self {
        self.trust_store = Some(store);
        self
    }

    /// Start the RPC server and listen for requests.
    ///
    /// Serves until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr: std::net::SocketAddr =
            format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("V2X RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                V2xJsonRpcServer::new(self.service()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, shutdown)
            .await?;

        Ok(())
    }

    fn service(&self) -> V2xServiceImpl {
        V2xServiceImpl {
            ledger: self.ledger.clone(),
            trust_store: self.trust_store.clone(),
        }
    }

    /// Dispatch a single envelope without going through the transport.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.service().dispatch(request).await
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The internal service implementation that holds shared state
/// and dispatches JSON-RPC calls to the appropriate handler.
#[derive(Clone)]
struct V2xServiceImpl {
    ledger: Arc<LedgerService>,
    trust_store: Option<Arc<RwLock<TrustStore>>>,
}

impl V2xServiceImpl {
    /// Dispatch a JSON-RPC request to the appropriate handler based on the method name.
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let ledger = self.ledger.as_ref();
        let result = match request.method.as_str() {
            // Transactions
            "transactions/new" => {
                dispatch_handler(request.params, |r| {
                    handlers::transactions::handle_new_transaction(ledger, r)
                })
                .await
            }
            "transactions/decrypt" => {
                dispatch_handler(request.params, |r| {
                    handlers::transactions::handle_decrypt_transaction(ledger, r)
                })
                .await
            }

            // Forging and chain
            "mine" => {
                dispatch_handler(request.params, |r| handlers::mining::handle_mine(ledger, r)).await
            }
            "chain" => {
                dispatch_handler(request.params, |r| handlers::chain::handle_get_chain(ledger, r))
                    .await
            }

            // Validators
            "validator/add" => {
                dispatch_handler(request.params, |r| {
                    handlers::validator::handle_add_validator(ledger, r)
                })
                .await
            }
            "validator/stake" => {
                dispatch_handler(request.params, |r| {
                    handlers::validator::handle_stake_validator(ledger, r)
                })
                .await
            }
            "validator/list" => {
                dispatch_handler(request.params, |r| {
                    handlers::validator::handle_list_validators(ledger, r)
                })
                .await
            }

            // Trust
            "trust/reputations" => match &self.trust_store {
                Some(store) => {
                    dispatch_handler(request.params, |r| {
                        handlers::trust::handle_get_reputations(store, r)
                    })
                    .await
                }
                None => Err(V2xError::Validation(
                    "trust store not available on this server".into(),
                )),
            },

            _ => Err(V2xError::Validation(format!(
                "Unknown method: {}",
                request.method
            ))),
        };

        match result {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => {
                if err.is_client_error() {
                    tracing::debug!(method = %request.method, error = %err, "RPC request rejected");
                } else {
                    tracing::warn!(method = %request.method, error = %err, "RPC request failed");
                }
                JsonRpcResponse::failure(&err)
            }
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
///
/// Missing or null params are treated as an empty object, so methods without
/// parameters can be called with no `params` at all.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, V2xError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Resp, V2xError>>,
{
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| V2xError::Validation(format!("Invalid request parameters: {}", e)))?;
    let response = handler(request).await?;
    Ok(serde_json::to_value(response)?)
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// A single service whose request and response bodies are raw JSON-encoded
// JsonRpcRequest/JsonRpcResponse bytes. No proto codegen.

/// The tonic service wrapper. Implements the low-level service
/// by accepting bytes, deserializing as JSON-RPC, and dispatching.
#[derive(Clone)]
pub struct V2xJsonRpcServer {
    inner: V2xServiceImpl,
}

impl std::fmt::Debug for V2xJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V2xJsonRpcServer").finish()
    }
}

impl V2xJsonRpcServer {
    fn new(inner: V2xServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for V2xJsonRpcServer {
    const NAME: &'static str = "v2x.rpc.LedgerService";
}

impl<B> tower_service::Service<http::Request<B>> for V2xJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    let err = V2xError::Validation(format!("Failed to read request body: {}", e));
                    return Ok(build_response(&JsonRpcResponse::failure(&err)));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let err = V2xError::Validation(format!("Invalid JSON-RPC request: {}", e));
                    return Ok(build_response(&JsonRpcResponse::failure(&err)));
                }
            };

            let rpc_response = inner.dispatch(rpc_request).await;
            Ok(build_response(&rpc_response))
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response carrying the JSON-encoded envelope.
fn build_response(response: &JsonRpcResponse) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(response).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut http_response = http::Response::new(body);
    http_response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    http_response
}
