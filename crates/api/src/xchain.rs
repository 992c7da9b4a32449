//! Ledger-A (the exchange chain, `X-` addresses) bindings.

use std::sync::Arc;

use gecko_types::{AccountAddressInfo, BalanceInfo, Credential, TransactionIdInfo, TransactionStatusInfo};
use serde_json::json;

use crate::{JsonRpcRequester, RpcError, call, params};

const XCHAIN_ENDPOINT: &str = "ext/bc/X";

#[derive(Clone)]
pub struct XChainApi {
    requester: Arc<dyn JsonRpcRequester>,
}

impl XChainApi {
    pub(crate) fn new(requester: Arc<dyn JsonRpcRequester>) -> Self {
        Self { requester }
    }

    /// Import a private key into the user's keystore and return its address.
    pub fn import_key(&self, credential: &Credential, private_key: &str) -> Result<String, RpcError> {
        let info: AccountAddressInfo = call(
            self.requester.as_ref(),
            XCHAIN_ENDPOINT,
            "avm.importKey",
            params(json!({
                "username": credential.username(),
                "password": credential.password(),
                "privateKey": private_key,
            })),
        )?;
        Ok(info.address)
    }

    pub fn create_address(&self, credential: &Credential) -> Result<String, RpcError> {
        let info: AccountAddressInfo = call(
            self.requester.as_ref(),
            XCHAIN_ENDPOINT,
            "avm.createAddress",
            params(json!({
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(info.address)
    }

    /// Send `amount` of `asset_id` from the user's addresses to `to`. Returns the transaction id.
    pub fn send(&self, amount: u64, asset_id: &str, to: &str, credential: &Credential) -> Result<String, RpcError> {
        let info: TransactionIdInfo = call(
            self.requester.as_ref(),
            XCHAIN_ENDPOINT,
            "avm.send",
            params(json!({
                "amount": amount.to_string(),
                "assetID": asset_id,
                "to": to,
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(info.tx_id)
    }

    /// Export value to a ledger-B address. Returns the transaction id.
    pub fn export_ava(&self, to: &str, amount: u64, credential: &Credential) -> Result<String, RpcError> {
        let info: TransactionIdInfo = call(
            self.requester.as_ref(),
            XCHAIN_ENDPOINT,
            "avm.exportAVA",
            params(json!({
                "to": to,
                "amount": amount.to_string(),
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(info.tx_id)
    }

    /// Import value previously exported from ledger-B into `to`. Returns the transaction id.
    pub fn import_ava(&self, to: &str, credential: &Credential) -> Result<String, RpcError> {
        let info: TransactionIdInfo = call(
            self.requester.as_ref(),
            XCHAIN_ENDPOINT,
            "avm.importAVA",
            params(json!({
                "to": to,
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(info.tx_id)
    }

    pub fn get_tx_status(&self, tx_id: &str) -> Result<String, RpcError> {
        let info: TransactionStatusInfo =
            call(self.requester.as_ref(), XCHAIN_ENDPOINT, "avm.getTxStatus", params(json!({ "txID": tx_id })))?;
        Ok(info.status)
    }

    pub fn get_balance(&self, address: &str, asset_id: &str) -> Result<String, RpcError> {
        let info: BalanceInfo = call(
            self.requester.as_ref(),
            XCHAIN_ENDPOINT,
            "avm.getBalance",
            params(json!({ "address": address, "assetID": asset_id })),
        )?;
        Ok(info.balance)
    }
}
