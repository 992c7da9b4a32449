//! Seeding from genesis and moving AVA between the X-Chain and the P-Chain.

use gecko_api::RpcError;
use gecko_types::Credential;
use tracing::{debug, info, warn};

use super::RpcWorkflowRunner;
use crate::{WorkflowError, error::RpcContext};

/// Whether `error` is the node reporting that a P-Chain export has not reached
/// the X-Chain yet, identified by `marker` appearing in the remote message.
pub fn is_pending_import_error(error: &RpcError, marker: &str) -> bool {
    error.remote_message().is_some_and(|message| message.contains(marker))
}

impl RpcWorkflowRunner {
    /// Create a fresh X-Chain address for this runner's user and fund it with
    /// `amount` AVA from the genesis account. Returns the new address once the
    /// funding transaction is accepted.
    pub fn create_and_seed_xchain_account_from_genesis(&self, amount: u64) -> Result<String, WorkflowError> {
        let genesis = self.config.genesis_credential();
        self.ensure_user(&self.credential);
        self.ensure_user(&genesis);

        let xchain = self.client.xchain_api();
        let genesis_address = xchain
            .import_key(&genesis, &self.config.genesis_private_key)
            .context("Failed to take control of genesis account")?;
        debug!(address = %genesis_address, "imported genesis key");

        let address = xchain
            .create_address(&self.credential)
            .context("Failed to create address on XChain")?;
        debug!(address = %address, "created XChain address");

        let tx_id = xchain
            .send(amount, &self.config.asset_id, &address, &genesis)
            .with_context(|| format!("Failed to send AVA to address {address}"))?;
        self.wait_for_xchain_transaction_acceptance(&tx_id)?;
        info!(address = %address, amount, tx_id = %tx_id, "seeded XChain address from genesis");
        Ok(address)
    }

    /// Move `amount` AVA from this user's X-Chain holdings into a new P-Chain
    /// account and return that account's address once it shows a balance.
    pub fn transfer_ava_xchain_to_pchain(&self, amount: u64) -> Result<String, WorkflowError> {
        let pchain = self.client.pchain_api();
        let pchain_address = pchain
            .create_account(&self.credential, None)
            .context("Failed to create new account on PChain")?;

        let export_tx_id = self
            .client
            .xchain_api()
            .export_ava(&pchain_address, amount, &self.credential)
            .with_context(|| format!("Failed to export AVA to PChain address {pchain_address}"))?;
        self.wait_for_xchain_transaction_acceptance(&export_tx_id)?;

        let payer_nonce = self.next_payer_nonce(&pchain_address)?;
        let import_tx = pchain
            .import_ava(&self.credential, &pchain_address, payer_nonce)
            .with_context(|| format!("Failed to import AVA to PChain address {pchain_address}"))?;
        let import_tx_id = pchain
            .issue_tx(&import_tx)
            .context("Failed to issue PChain importAVA transaction")?;
        debug!(address = %pchain_address, tx_id = %import_tx_id, "issued PChain import");

        self.wait_for_pchain_non_zero_balance(&pchain_address)?;
        info!(address = %pchain_address, amount, "moved AVA from XChain to PChain");
        Ok(pchain_address)
    }

    /// Move `amount` AVA from `pchain_address` to `xchain_address`. Both must be
    /// owned by this runner's user. Returns the prefixed X-Chain address.
    pub fn transfer_ava_pchain_to_xchain(&self, pchain_address: &str, xchain_address: &str, amount: u64) -> Result<String, WorkflowError> {
        let prefix = self.config.xchain_address_prefix.as_str();
        let bare_address = xchain_address.strip_prefix(prefix).unwrap_or(xchain_address);
        let prefixed_address = format!("{prefix}{bare_address}");

        let pchain = self.client.pchain_api();
        let payer_nonce = self.next_payer_nonce(pchain_address)?;
        // The P-Chain export takes the X-Chain address without its prefix.
        let unsigned_tx = pchain
            .export_ava(amount, bare_address, payer_nonce)
            .with_context(|| format!("Failed to export AVA to XChain address {prefixed_address}"))?;
        let signed_tx = pchain
            .sign(&unsigned_tx, pchain_address, &self.credential)
            .context("Failed to sign PChain exportAVA transaction")?;
        let export_tx_id = pchain
            .issue_tx(&signed_tx)
            .context("Failed to issue PChain exportAVA transaction")?;
        debug!(from = %pchain_address, to = %prefixed_address, tx_id = %export_tx_id, "issued PChain export");

        let import_tx_id = self.import_ava_into_xchain(&prefixed_address)?;
        self.wait_for_xchain_transaction_acceptance(&import_tx_id)?;
        info!(from = %pchain_address, to = %prefixed_address, amount, "moved AVA from PChain to XChain");
        Ok(prefixed_address)
    }

    /// Import into the X-Chain, retrying while the node reports the P-Chain
    /// export as not yet final. Any other failure ends the loop.
    fn import_ava_into_xchain(&self, xchain_address: &str) -> Result<String, WorkflowError> {
        let marker = self.config.pending_import_error.as_str();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let error = match self.client.xchain_api().import_ava(xchain_address, &self.credential) {
                Ok(tx_id) => {
                    debug!(address = %xchain_address, attempts, "XChain import issued");
                    return Ok(tx_id);
                }
                Err(error) if is_pending_import_error(&error, marker) => error,
                Err(error) => {
                    return Err(WorkflowError::Rpc {
                        step: format!("Failed to import AVA to XChain address {xchain_address}"),
                        source: error,
                    });
                }
            };

            if self.config.import_retry_limit.is_some_and(|limit| attempts >= limit) {
                warn!(address = %xchain_address, attempts, "PChain export never became importable");
                return Err(WorkflowError::ImportRetriesExhausted {
                    address: xchain_address.to_string(),
                    attempts,
                    source: error,
                });
            }
            debug!(address = %xchain_address, attempts, "PChain export not yet importable, retrying");
            self.clock.sleep(self.config.import_retry_interval);
        }
    }

    /// Create a keystore user, treating failure as "already exists".
    fn ensure_user(&self, credential: &Credential) {
        match self.client.keystore_api().create_user(credential) {
            Ok(_) => debug!(username = %credential.username(), "created keystore user"),
            Err(error) => debug!(username = %credential.username(), %error, "keystore user not created"),
        }
    }
}
