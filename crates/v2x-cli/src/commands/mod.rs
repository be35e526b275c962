// crates/v2x-cli/src/commands/mod.rs
//
// Command module declarations for the V2X CLI.

pub mod chain;
pub mod mine;
pub mod reputations;
pub mod transaction;
pub mod validator;
