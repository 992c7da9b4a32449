//! Runner configuration.
//!
//! Timing offsets, genesis credentials, fee rate and retry knobs live here
//! rather than in constants so tests can shrink or stretch them without
//! touching workflow code. A config can be built in code, loaded from a YAML
//! or JSON file, and then overridden from the environment.

use std::{env, fs, path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use gecko_types::{Credential, StakingRole};
use serde::{Deserialize, Serialize};

use crate::wait::WaitPolicy;

pub const ACCEPTANCE_TIMEOUT_ENV: &str = "GECKO_ACCEPTANCE_TIMEOUT_SECS";
pub const GENESIS_USERNAME_ENV: &str = "GECKO_GENESIS_USERNAME";
pub const GENESIS_PASSWORD_ENV: &str = "GECKO_GENESIS_PASSWORD";
pub const GENESIS_PRIVATE_KEY_ENV: &str = "GECKO_GENESIS_PRIVATE_KEY";

/// Private key funded in the default local-network genesis.
pub const DEFAULT_GENESIS_PRIVATE_KEY: &str = "ewoqjP7PxY4yr3iLTpLisriqt94hdyDFNgchSxGGztUrTXtNN";

/// When a staking window opens and closes, both measured from the moment the
/// transaction is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingWindow {
    #[serde(with = "duration_secs")]
    pub start_delay: Duration,
    #[serde(with = "duration_secs")]
    pub end_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub genesis_username: String,
    pub genesis_password: String,
    pub genesis_private_key: String,
    /// Asset sent when seeding accounts from genesis.
    pub asset_id: String,
    /// Transaction status literal reported once a transaction is accepted.
    pub accepted_status: String,
    /// Budget shared by every wait for eventual network state.
    #[serde(with = "duration_secs")]
    pub network_acceptance_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    pub staking: StakingWindow,
    pub delegating: StakingWindow,
    pub delegation_fee_rate: u64,
    /// Prefix of X-Chain addresses; the P-Chain export expects it stripped.
    pub xchain_address_prefix: String,
    /// Remote error text meaning the P-Chain export has not reached the X-Chain yet.
    pub pending_import_error: String,
    #[serde(with = "duration_secs")]
    pub import_retry_interval: Duration,
    /// Ceiling on X-Chain import attempts; `None` retries for as long as the export is pending.
    pub import_retry_limit: Option<u32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            genesis_username: "genesis".into(),
            genesis_password: "genesis34!23".into(),
            genesis_private_key: DEFAULT_GENESIS_PRIVATE_KEY.into(),
            asset_id: "AVA".into(),
            accepted_status: "Accepted".into(),
            network_acceptance_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(1),
            staking: StakingWindow {
                start_delay: Duration::from_secs(20),
                end_delay: Duration::from_secs(72 * 60 * 60),
            },
            delegating: StakingWindow {
                start_delay: Duration::from_secs(20),
                end_delay: Duration::from_secs(72 * 60 * 60),
            },
            delegation_fee_rate: 500_000,
            xchain_address_prefix: "X-".into(),
            pending_import_error: "problem issuing transaction: no import inputs".into(),
            import_retry_interval: Duration::from_secs(1),
            import_retry_limit: None,
        }
    }
}

impl RunnerConfig {
    /// Load a config from a YAML or JSON file. Missing fields take their defaults.
    pub fn from_file(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read runner config: {}", file_path.display()))?;
        let config: Self =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse runner config: {}", file_path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid runner config: {}", file_path.display()))?;
        Ok(config)
    }

    /// Reject settings that would turn a wait into a busy loop against the node.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            bail!("pollInterval must be at least one second");
        }
        if self.import_retry_interval.is_zero() {
            bail!("importRetryInterval must be at least one second");
        }
        Ok(())
    }

    /// Apply `GECKO_ACCEPTANCE_TIMEOUT_SECS` and the `GECKO_GENESIS_*` variables when set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = env::var(ACCEPTANCE_TIMEOUT_ENV) {
            let seconds: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ACCEPTANCE_TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'"))?;
            self.network_acceptance_timeout = Duration::from_secs(seconds);
        }
        if let Ok(username) = env::var(GENESIS_USERNAME_ENV) {
            self.genesis_username = username;
        }
        if let Ok(password) = env::var(GENESIS_PASSWORD_ENV) {
            self.genesis_password = password;
        }
        if let Ok(private_key) = env::var(GENESIS_PRIVATE_KEY_ENV) {
            self.genesis_private_key = private_key;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_acceptance_timeout(mut self, timeout: Duration) -> Self {
        self.network_acceptance_timeout = timeout;
        self
    }

    pub fn genesis_credential(&self) -> Credential {
        Credential::new(&self.genesis_username, &self.genesis_password)
    }

    pub fn acceptance_policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.poll_interval, self.network_acceptance_timeout)
    }

    pub fn window(&self, role: StakingRole) -> StakingWindow {
        match role {
            StakingRole::Validator => self.staking,
            StakingRole::Delegator => self.delegating,
        }
    }
}

/// Serde adapter storing a `Duration` as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
