//! Gecko node API client.
//!
//! This crate provides a thin, typed client for a Gecko node's JSON-RPC
//! interface. It focuses on:
//!
//! - Building the versioned request envelope and posting it over HTTP
//! - Failing uniformly on transport errors, non-200 statuses, malformed
//!   envelopes and non-zero embedded RPC error codes
//! - One binding per RPC method, grouped by subsystem (node info, keystore,
//!   ledger-A, ledger-B), with typed result decoding
//!
//! The primary entry point is [`GeckoClient`]. Create an instance via
//! [`GeckoClient::from_env`] or [`GeckoClient::from_config`], or wrap any
//! [`JsonRpcRequester`] with [`GeckoClient::new`].
//!
//! # Example
//!
//! ```ignore
//! use gecko_api::GeckoClient;
//!
//! fn main() -> anyhow::Result<()> {
//!     let client = GeckoClient::from_env()?;
//!     let node_id = client.info_api().get_node_id()?;
//!     println!("node: {node_id}");
//!     Ok(())
//! }
//! ```

mod error;
mod info;
mod keystore;
mod pchain;
mod requester;
mod xchain;

use std::sync::Arc;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::RpcError;
pub use info::InfoApi;
pub use keystore::KeystoreApi;
pub use pchain::PChainApi;
pub use requester::{
    DEFAULT_RPC_URL, HttpRpcRequester, JSON_RPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcRequester, JsonRpcResponse, Params,
    RPC_TIMEOUT_ENV, RPC_URL_ENV, RequesterConfig, decode_envelope,
};
pub use xchain::XChainApi;

/// Handle to every subsystem binding of one node, sharing a single requester.
#[derive(Clone)]
pub struct GeckoClient {
    info: InfoApi,
    keystore: KeystoreApi,
    xchain: XChainApi,
    pchain: PChainApi,
}

impl GeckoClient {
    pub fn new(requester: Arc<dyn JsonRpcRequester>) -> Self {
        Self {
            info: InfoApi::new(requester.clone()),
            keystore: KeystoreApi::new(requester.clone()),
            xchain: XChainApi::new(requester.clone()),
            pchain: PChainApi::new(requester),
        }
    }

    /// Build an HTTP-backed client from explicit connection settings.
    pub fn from_config(config: RequesterConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpRpcRequester::new(config)?)))
    }

    /// Build an HTTP-backed client from `GECKO_RPC_URL` / `GECKO_RPC_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_config(RequesterConfig::from_env()?)
    }

    pub fn info_api(&self) -> &InfoApi {
        &self.info
    }

    pub fn keystore_api(&self) -> &KeystoreApi {
        &self.keystore
    }

    pub fn xchain_api(&self) -> &XChainApi {
        &self.xchain
    }

    pub fn pchain_api(&self) -> &PChainApi {
        &self.pchain
    }
}

/// Issue `method` and decode its `result` into `T`.
pub(crate) fn call<T: DeserializeOwned>(
    requester: &dyn JsonRpcRequester,
    endpoint: &str,
    method: &str,
    params: Params,
) -> Result<T, RpcError> {
    let result = requester.make_rpc_request(endpoint, method, params)?;
    serde_json::from_value(result).map_err(|error| RpcError::decode(method, error.to_string()))
}

/// Unwrap a `json!` object literal into a parameter map.
pub(crate) fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
