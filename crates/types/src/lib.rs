//! Shared types for talking to a Gecko node over JSON-RPC.
//!
//! The structs in this crate mirror the `result` objects returned by the
//! node's RPC methods. Field names follow the node's camelCase schema and are
//! part of the wire contract, so renames here must match the node exactly.
//!
//! Quantities the node reports as JSON strings (nonces, balances, stake
//! amounts, timestamps) are kept as `String` on the wire types and parsed by
//! the caller that needs a number. This keeps decoding lossless and lets the
//! runner decide how to treat a malformed value.

mod credential;
mod results;
mod staking;

pub use credential::Credential;
pub use results::*;
pub use staking::{StakingDescriptor, StakingRole};
