//! Validator and delegator registration workflows.

use gecko_types::{StakingDescriptor, StakingRole};
use tracing::{debug, info, warn};

use super::RpcWorkflowRunner;
use crate::{WorkflowError, error::RpcContext};

impl RpcWorkflowRunner {
    /// Take this node from no AVA to validating the default subnet.
    ///
    /// Seeds an X-Chain account from genesis, moves `seed_amount` to a fresh
    /// P-Chain account, seeds a second X-Chain account, and registers the
    /// node as a validator staking `stake_amount` from the P-Chain account.
    pub fn get_funds_and_start_validating(&self, seed_amount: u64, stake_amount: u64) -> Result<(), WorkflowError> {
        let staker_node_id = self.client.info_api().get_node_id().context("Could not get staker node ID")?;
        info!(node_id = %staker_node_id, seed_amount, stake_amount, "funding node and registering it as a validator");

        self.create_and_seed_xchain_account_from_genesis(seed_amount)
            .inspect_err(|error| warn!(%error, "could not seed XChain account from genesis"))?;
        let staker_pchain_address = self
            .transfer_ava_xchain_to_pchain(seed_amount)
            .inspect_err(|error| warn!(%error, "could not transfer AVA from XChain to PChain"))?;
        // The second seed is kept as-is; it may offset fees paid by the transfer.
        self.create_and_seed_xchain_account_from_genesis(seed_amount)
            .inspect_err(|error| warn!(%error, "could not seed XChain account from genesis"))?;

        self.add_validator_on_subnet(&staker_node_id, &staker_pchain_address, stake_amount)
            .inspect_err(|error| warn!(node_id = %staker_node_id, %error, "could not add staker to default subnet"))
    }

    /// Delegate `stake_amount` from `pchain_address` to `delegatee_node_id`.
    ///
    /// Returns once the wall clock has passed the delegation start time. That
    /// only guarantees the activation window has opened, not that the
    /// network has processed the transaction.
    pub fn add_delegator_on_subnet(&self, delegatee_node_id: &str, pchain_address: &str, stake_amount: u64) -> Result<(), WorkflowError> {
        let descriptor = self.register_staker(StakingRole::Delegator, delegatee_node_id, pchain_address, stake_amount)?;
        self.wait_for_start_time(descriptor.start_time);
        info!(node_id = %delegatee_node_id, address = %pchain_address, "delegation window opened");
        Ok(())
    }

    /// Register `node_id` as a default-subnet validator staking from `pchain_address`,
    /// then wait for it to show up in the current validator set.
    pub fn add_validator_on_subnet(&self, node_id: &str, pchain_address: &str, stake_amount: u64) -> Result<(), WorkflowError> {
        let descriptor = self.register_staker(StakingRole::Validator, node_id, pchain_address, stake_amount)?;
        self.wait_for_start_time(descriptor.start_time);
        self.wait_for_validator_addition(node_id, None)?;
        info!(node_id = %node_id, "node is validating the default subnet");
        Ok(())
    }

    /// Build, sign and issue a staking transaction; returns the descriptor it was built from.
    fn register_staker(
        &self,
        role: StakingRole,
        node_id: &str,
        pchain_address: &str,
        stake_amount: u64,
    ) -> Result<StakingDescriptor, WorkflowError> {
        let payer_nonce = self.next_payer_nonce(pchain_address)?;
        let descriptor = self.staking_descriptor(role, node_id, pchain_address, stake_amount, payer_nonce);
        debug!(
            ?role,
            node_id = %node_id,
            start_time = descriptor.start_time,
            end_time = descriptor.end_time,
            payer_nonce,
            "built staking descriptor"
        );

        let pchain = self.client.pchain_api();
        let unsigned_tx = pchain
            .add_default_subnet_staker(&descriptor)
            .with_context(|| format!("Failed to add default subnet {} {node_id}", role_label(role)))?;
        let signed_tx = pchain
            .sign(&unsigned_tx, pchain_address, &self.credential)
            .with_context(|| format!("Failed to sign {} transaction", role_label(role)))?;
        let tx_id = pchain
            .issue_tx(&signed_tx)
            .with_context(|| format!("Failed to issue {} transaction", role_label(role)))?;
        info!(?role, node_id = %node_id, tx_id = %tx_id, "issued staking transaction");
        Ok(descriptor)
    }

    pub(crate) fn staking_descriptor(
        &self,
        role: StakingRole,
        node_id: &str,
        pchain_address: &str,
        stake_amount: u64,
        payer_nonce: u64,
    ) -> StakingDescriptor {
        let window = self.config.window(role);
        let now = self.clock.now().timestamp();
        StakingDescriptor {
            role,
            node_id: node_id.to_string(),
            start_time: now.saturating_add(window.start_delay.as_secs() as i64),
            end_time: now.saturating_add(window.end_delay.as_secs() as i64),
            stake_amount,
            delegation_fee_rate: match role {
                StakingRole::Validator => Some(self.config.delegation_fee_rate),
                StakingRole::Delegator => None,
            },
            payer_nonce,
            payer_address: pchain_address.to_string(),
        }
    }

    /// Sleep in poll-interval steps until the wall clock reaches `start_time`.
    pub(crate) fn wait_for_start_time(&self, start_time: i64) {
        while self.clock.now().timestamp() < start_time {
            self.clock.sleep(self.config.poll_interval);
        }
    }
}

fn role_label(role: StakingRole) -> &'static str {
    match role {
        StakingRole::Validator => "validator",
        StakingRole::Delegator => "delegator",
    }
}
