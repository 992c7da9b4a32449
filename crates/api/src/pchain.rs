//! Ledger-B (the platform chain) bindings.
//!
//! State-mutating calls here return unsigned transactions that must be signed
//! with [`PChainApi::sign`] and submitted with [`PChainApi::issue_tx`]; each
//! of them also requires the payer's next nonce.

use std::sync::Arc;

use gecko_types::{
    AccountAddressInfo, AccountInfo, AccountList, Credential, PrivateKeyInfo, SignedTransactionInfo, StakingDescriptor,
    StakingRole, Subnet, SubnetList, TransactionIdInfo, UnsignedTransactionInfo, ValidatorList,
};
use serde_json::{Value, json};

use crate::{JsonRpcRequester, RpcError, call, params};

const PCHAIN_ENDPOINT: &str = "ext/P";

#[derive(Clone)]
pub struct PChainApi {
    requester: Arc<dyn JsonRpcRequester>,
}

impl PChainApi {
    pub(crate) fn new(requester: Arc<dyn JsonRpcRequester>) -> Self {
        Self { requester }
    }

    /// Create an account controlled by the user, optionally from an existing private key.
    pub fn create_account(&self, credential: &Credential, private_key: Option<&str>) -> Result<String, RpcError> {
        let mut request = params(json!({
            "username": credential.username(),
            "password": credential.password(),
        }));
        if let Some(private_key) = private_key {
            request.insert("privateKey".into(), Value::String(private_key.to_string()));
        }
        let info: AccountAddressInfo = call(self.requester.as_ref(), PCHAIN_ENDPOINT, "platform.createAccount", request)?;
        Ok(info.address)
    }

    pub fn get_account(&self, address: &str) -> Result<AccountInfo, RpcError> {
        call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.getAccount",
            params(json!({ "address": address })),
        )
    }

    pub fn list_accounts(&self, credential: &Credential) -> Result<Vec<AccountInfo>, RpcError> {
        let list: AccountList = call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.listAccounts",
            params(json!({
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(list.accounts)
    }

    pub fn export_key(&self, credential: &Credential, address: &str) -> Result<String, RpcError> {
        let info: PrivateKeyInfo = call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.exportKey",
            params(json!({
                "username": credential.username(),
                "password": credential.password(),
                "address": address,
            })),
        )?;
        Ok(info.private_key)
    }

    /// Build an unsigned "add validator" or "add delegator" transaction from `descriptor`.
    pub fn add_default_subnet_staker(&self, descriptor: &StakingDescriptor) -> Result<String, RpcError> {
        let mut request = params(json!({
            "id": descriptor.node_id,
            "startTime": descriptor.start_time.to_string(),
            "endTime": descriptor.end_time.to_string(),
            "stakeAmount": descriptor.stake_amount.to_string(),
            "payerNonce": descriptor.payer_nonce.to_string(),
            "destination": descriptor.payer_address,
        }));
        let method = match descriptor.role {
            StakingRole::Validator => {
                let fee_rate = descriptor.delegation_fee_rate.unwrap_or_default();
                request.insert("delegationFeeRate".into(), Value::String(fee_rate.to_string()));
                "platform.addDefaultSubnetValidator"
            }
            StakingRole::Delegator => "platform.addDefaultSubnetDelegator",
        };
        let info: UnsignedTransactionInfo = call(self.requester.as_ref(), PCHAIN_ENDPOINT, method, request)?;
        Ok(info.unsigned_tx)
    }

    /// Build an unsigned export of `amount` to a ledger-A address given without its chain prefix.
    pub fn export_ava(&self, amount: u64, to: &str, payer_nonce: u64) -> Result<String, RpcError> {
        let info: UnsignedTransactionInfo = call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.exportAVA",
            params(json!({
                "amount": amount.to_string(),
                "to": to,
                "payerNonce": payer_nonce.to_string(),
            })),
        )?;
        Ok(info.unsigned_tx)
    }

    /// Build a signed import of value exported from ledger-A into `to`.
    pub fn import_ava(&self, credential: &Credential, to: &str, payer_nonce: u64) -> Result<String, RpcError> {
        let info: SignedTransactionInfo = call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.importAVA",
            params(json!({
                "username": credential.username(),
                "password": credential.password(),
                "to": to,
                "payerNonce": payer_nonce.to_string(),
            })),
        )?;
        Ok(info.tx)
    }

    /// Sign `tx` with the key controlling `address`.
    pub fn sign(&self, tx: &str, address: &str, credential: &Credential) -> Result<String, RpcError> {
        let info: SignedTransactionInfo = call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.sign",
            params(json!({
                "tx": tx,
                "address": address,
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(info.tx)
    }

    /// Submit a signed transaction. Returns the transaction id.
    pub fn issue_tx(&self, tx: &str) -> Result<String, RpcError> {
        let info: TransactionIdInfo = call(self.requester.as_ref(), PCHAIN_ENDPOINT, "platform.issueTx", params(json!({ "tx": tx })))?;
        Ok(info.tx_id)
    }

    /// Current validator set, for the default subnet when `subnet_id` is `None`.
    pub fn get_current_validators(&self, subnet_id: Option<&str>) -> Result<ValidatorList, RpcError> {
        call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.getCurrentValidators",
            subnet_params(subnet_id),
        )
    }

    pub fn get_pending_validators(&self, subnet_id: Option<&str>) -> Result<ValidatorList, RpcError> {
        call(
            self.requester.as_ref(),
            PCHAIN_ENDPOINT,
            "platform.getPendingValidators",
            subnet_params(subnet_id),
        )
    }

    /// Subnets known to the node, optionally restricted to `ids`.
    pub fn get_subnets(&self, ids: Option<&[String]>) -> Result<Vec<Subnet>, RpcError> {
        let request = match ids {
            Some(ids) => params(json!({ "ids": ids })),
            None => params(json!({})),
        };
        let list: SubnetList = call(self.requester.as_ref(), PCHAIN_ENDPOINT, "platform.getSubnets", request)?;
        Ok(list.subnets)
    }
}

fn subnet_params(subnet_id: Option<&str>) -> crate::Params {
    match subnet_id {
        Some(subnet_id) => params(json!({ "subnetID": subnet_id })),
        None => params(json!({})),
    }
}
