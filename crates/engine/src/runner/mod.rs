//! RPC workflow runner.
//!
//! [`RpcWorkflowRunner`] executes the standard test-network workflows
//! (funding accounts from genesis, moving AVA between the X-Chain and the
//! P-Chain, registering validators and delegators) against one node, acting
//! as the keystore user held in its [`Credential`].
//!
//! Steps inside a workflow are strictly sequential: each one consumes the
//! address, nonce or transaction handle produced by the previous one. A
//! failed step aborts the workflow and leaves the network wherever the
//! completed steps put it; nothing is rolled back.
//!
//! Payer nonces are read from the node immediately before every mutating
//! P-Chain call and never cached. Concurrent workflows against different
//! addresses are therefore safe, but callers must serialize workflows that
//! mutate the same P-Chain address.

mod staking;
mod transfer;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use gecko_api::GeckoClient;
use gecko_types::{AccountInfo, Credential};
use tracing::debug;

use crate::{
    RunnerConfig, WorkflowError,
    clock::{Clock, SystemClock},
    error::{RpcContext, WaitTarget},
    wait::wait_until,
};

pub use transfer::is_pending_import_error;

/// Literal balance the P-Chain reports for an unfunded account.
const ZERO_BALANCE: &str = "0";

pub struct RpcWorkflowRunner {
    client: GeckoClient,
    credential: Credential,
    config: RunnerConfig,
    clock: Arc<dyn Clock>,
}

impl RpcWorkflowRunner {
    pub fn new(client: GeckoClient, credential: Credential, config: RunnerConfig) -> Self {
        Self {
            client,
            credential,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock, typically with a [`crate::ManualClock`] in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &GeckoClient {
        &self.client
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Read the current payer nonce of `pchain_address` from the node.
    pub fn current_payer_nonce(&self, pchain_address: &str) -> Result<u64, WorkflowError> {
        let account = self.pchain_account(pchain_address)?;
        account.nonce.trim().parse().map_err(|source| WorkflowError::InvalidNonce {
            address: pchain_address.to_string(),
            raw: account.nonce.clone(),
            source,
        })
    }

    /// Nonce the next mutating call paid by `pchain_address` must carry.
    pub fn next_payer_nonce(&self, pchain_address: &str) -> Result<u64, WorkflowError> {
        let current = self.current_payer_nonce(pchain_address)?;
        debug!(address = %pchain_address, current, "fetched payer nonce");
        current.checked_add(1).ok_or_else(|| WorkflowError::NonceOverflow {
            address: pchain_address.to_string(),
        })
    }

    /// Current X-Chain balance of `address` in the configured asset.
    pub fn xchain_balance(&self, address: &str) -> Result<u64, WorkflowError> {
        let raw = self
            .client
            .xchain_api()
            .get_balance(address, &self.config.asset_id)
            .with_context(|| format!("Failed to get balance of XChain address {address}"))?;
        raw.trim().parse().map_err(|source| WorkflowError::InvalidBalance {
            address: address.to_string(),
            raw,
            source,
        })
    }

    /// Block until X-Chain transaction `tx_id` reports the accepted status.
    pub fn wait_for_xchain_transaction_acceptance(&self, tx_id: &str) -> Result<(), WorkflowError> {
        let accepted = self.config.accepted_status.as_str();
        wait_until(
            self.clock.as_ref(),
            self.config.acceptance_policy(),
            || {
                let status = self.client.xchain_api().get_tx_status(tx_id).context("Failed to get status")?;
                debug!(tx_id = %tx_id, status = %status, "polled transaction status");
                Ok(status)
            },
            |status| status == accepted,
            |last_status| self.timeout(WaitTarget::Transaction { tx_id: tx_id.to_string() }, last_status),
        )
        .map(|_| ())
    }

    /// Block until `node_id` appears in the current validator set of `subnet_id`
    /// (the default subnet when `None`).
    pub fn wait_for_validator_addition(&self, node_id: &str, subnet_id: Option<&str>) -> Result<(), WorkflowError> {
        wait_until(
            self.clock.as_ref(),
            self.config.acceptance_policy(),
            || {
                self.client
                    .pchain_api()
                    .get_current_validators(subnet_id)
                    .context("Could not get current validators")
            },
            |list| list.contains_node(node_id),
            |list| {
                self.timeout(
                    WaitTarget::Validator {
                        node_id: node_id.to_string(),
                        subnet_id: subnet_id.map(str::to_string),
                    },
                    format!("{} validators", list.validators.len()),
                )
            },
        )
        .map(|_| ())
    }

    /// Block until P-Chain account `pchain_address` holds a non-zero balance.
    ///
    /// Polls the balance rather than a transaction status because the P-Chain
    /// has no status endpoint to poll.
    pub fn wait_for_pchain_non_zero_balance(&self, pchain_address: &str) -> Result<(), WorkflowError> {
        wait_until(
            self.clock.as_ref(),
            self.config.acceptance_policy(),
            || {
                let account = self.pchain_account(pchain_address)?;
                debug!(address = %pchain_address, balance = %account.balance, "polled account balance");
                Ok(account.balance)
            },
            |balance| balance.trim() != ZERO_BALANCE,
            |balance| {
                self.timeout(
                    WaitTarget::Balance {
                        address: pchain_address.to_string(),
                    },
                    balance,
                )
            },
        )
        .map(|_| ())
    }

    fn pchain_account(&self, pchain_address: &str) -> Result<AccountInfo, WorkflowError> {
        self.client
            .pchain_api()
            .get_account(pchain_address)
            .with_context(|| format!("Failed to get PChain account info for {pchain_address}"))
    }

    fn timeout(&self, target: WaitTarget, last_observed: String) -> WorkflowError {
        WorkflowError::Timeout {
            target,
            timeout: self.config.network_acceptance_timeout,
            last_observed,
        }
    }
}
