// crates/v2x-rpc/src/handlers/mod.rs
//
// RPC handler modules for the V2X opinion ledger.
//
// Each module maps one group of JSON-RPC methods onto the ledger service or
// the trust store. Handlers take typed request structs and return typed
// responses; the server takes care of (de)serialization.

pub mod chain;
pub mod mining;
pub mod transactions;
pub mod trust;
pub mod validator;
