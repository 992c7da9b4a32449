//! Workflow failure taxonomy.

use std::{fmt, num::ParseIntError, time::Duration};

use gecko_api::RpcError;
use thiserror::Error;

/// Resource a polling wait was blocked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitTarget {
    /// An X-Chain transaction reaching the accepted state.
    Transaction { tx_id: String },
    /// A node appearing in a validator set (the default subnet when `subnet_id` is `None`).
    Validator { node_id: String, subnet_id: Option<String> },
    /// A P-Chain account receiving a non-zero balance.
    Balance { address: String },
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction { tx_id } => write!(f, "transaction {tx_id} to be accepted on the XChain"),
            Self::Validator {
                node_id,
                subnet_id: Some(subnet_id),
            } => write!(f, "node {node_id} to be accepted as a validator of subnet {subnet_id}"),
            Self::Validator { node_id, subnet_id: None } => {
                write!(f, "node {node_id} to be accepted as a validator by the network")
            }
            Self::Balance { address } => write!(f, "PChain address {address} to receive funds"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An RPC call failed; `step` names what the runner was doing.
    #[error("{step}: {source}")]
    Rpc {
        step: String,
        #[source]
        source: RpcError,
    },

    /// A polling wait exhausted the network acceptance timeout.
    #[error("timed out after {timeout:?} waiting for {target} (last observed: {last_observed})")]
    Timeout {
        target: WaitTarget,
        timeout: Duration,
        last_observed: String,
    },

    #[error("payer nonce '{raw}' of PChain account {address} is not a non-negative integer: {source}")]
    InvalidNonce {
        address: String,
        raw: String,
        #[source]
        source: ParseIntError,
    },

    #[error("payer nonce of PChain account {address} is already at its maximum value")]
    NonceOverflow { address: String },

    #[error("balance '{raw}' of XChain address {address} is not a non-negative integer: {source}")]
    InvalidBalance {
        address: String,
        raw: String,
        #[source]
        source: ParseIntError,
    },

    /// The X-Chain import kept reporting that the P-Chain export was not final.
    #[error("gave up importing AVA into {address} after {attempts} attempts: {source}")]
    ImportRetriesExhausted {
        address: String,
        attempts: u32,
        #[source]
        source: RpcError,
    },
}

impl WorkflowError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The RPC failure at the root of this error, if any.
    pub fn rpc_source(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc { source, .. } | Self::ImportRetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Attach a step description to an RPC result, in the spirit of `anyhow::Context`.
pub(crate) trait RpcContext<T> {
    fn context(self, step: impl Into<String>) -> Result<T, WorkflowError>;

    fn with_context<F, S>(self, step: F) -> Result<T, WorkflowError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> RpcContext<T> for Result<T, RpcError> {
    fn context(self, step: impl Into<String>) -> Result<T, WorkflowError> {
        self.map_err(|source| WorkflowError::Rpc {
            step: step.into(),
            source,
        })
    }

    fn with_context<F, S>(self, step: F) -> Result<T, WorkflowError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| WorkflowError::Rpc {
            step: step().into(),
            source,
        })
    }
}
