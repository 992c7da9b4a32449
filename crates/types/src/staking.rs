//! Descriptor for validator and delegator registration transactions.

/// Whether a descriptor registers the node as a validator or delegates stake
/// to an existing validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingRole {
    Validator,
    Delegator,
}

/// Everything the ledger-B node needs to build an unsigned "add validator" or
/// "add delegator" transaction.
///
/// `start_time` and `end_time` are Unix timestamps in seconds. The start must
/// still be in the future when the transaction is issued, and the end must be
/// later than the start by the configured staking window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingDescriptor {
    pub role: StakingRole,
    /// Node identity being validated (for delegators, the delegatee).
    pub node_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub stake_amount: u64,
    /// Only validators carry a delegation fee rate.
    pub delegation_fee_rate: Option<u64>,
    /// Nonce the payer account must use, already incremented past the current one.
    pub payer_nonce: u64,
    /// Ledger-B address that pays for and receives the stake.
    pub payer_address: String,
}

impl StakingDescriptor {
    /// Length of the staking window in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }
}
