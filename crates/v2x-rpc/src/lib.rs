// crates/v2x-rpc/src/lib.rs
//
// v2x-rpc: JSON-RPC server and handlers for the V2X opinion ledger.
//
// Exposes transaction submission, forging, decryption, chain retrieval,
// validator management, and reputation queries as JSON-RPC methods served
// over tonic.

pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server types for ergonomic access.
pub use server::{JsonRpcRequest, JsonRpcResponse, RpcConfig, V2xRpcServer};
