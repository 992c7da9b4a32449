//! Error type shared by the requester and every binding.

use gecko_util::RuntimeError;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single RPC round trip.
///
/// Every variant renders with the same "RPC call failed" prefix so log lines
/// read uniformly, but callers that need to tell a remote application error
/// apart from a transport problem can match on [`RpcError::Remote`].
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC call failed: could not serialize request for method '{method}' to endpoint '{endpoint}': {source}")]
    Serialization {
        endpoint: String,
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("RPC call failed: error making JSON-RPC POST request for method '{method}' to {url}: {source}")]
    Transport {
        url: String,
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("RPC call failed: method '{method}' received response from {url} with non-200 code '{status}' and body '{body}'")]
    Status {
        url: String,
        method: String,
        status: u16,
        body: String,
    },

    #[error("RPC call failed: could not decode response of method '{method}': {message}")]
    Decode { method: String, message: String },

    #[error("RPC call failed: method '{method}' returned error {code}: {message}")]
    Remote {
        method: String,
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("RPC call failed: {0}")]
    Runtime(#[from] RuntimeError),
}

impl RpcError {
    pub fn decode(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn remote(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self::Remote {
            method: method.into(),
            code,
            message: message.into(),
            data: None,
        }
    }

    /// The node-supplied error message, when the node rejected the call.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// The node-supplied error code, when the node rejected the call.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
