//! # Gecko Engine
//!
//! The Gecko Engine drives multi-step test-network scenarios against a
//! running Gecko node: funding accounts from the genesis allocation, moving
//! AVA between the X-Chain and the P-Chain, and registering validators and
//! delegators on the default subnet.
//!
//! ## Key Features
//!
//! - **Sequential workflows**: each step feeds the next its address, nonce or transaction handle
//! - **Bounded waits**: every wait for eventual network state polls on a fixed interval under one configurable timeout
//! - **Fresh nonces**: P-Chain payer nonces are re-read before every mutating call
//! - **Injectable time**: a [`Clock`] lets tests run staking windows in virtual time
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gecko_api::GeckoClient;
//! use gecko_engine::{RpcWorkflowRunner, RunnerConfig};
//! use gecko_types::Credential;
//!
//! let client = GeckoClient::from_env()?;
//! let config = RunnerConfig::default().with_env_overrides()?;
//! let runner = RpcWorkflowRunner::new(client, Credential::new("staker", "staker-password-1"), config);
//! runner.get_funds_and_start_validating(100_000_000, 10_000_000)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`runner`**: the workflows and the waits they are built from
//! - **`wait`**: the generic poll-until-ready loop
//! - **`clock`**: wall-clock abstraction with a manual test double
//! - **`config`**: timing, genesis and retry settings
//! - **`error`**: the workflow failure taxonomy

pub mod clock;
pub mod config;
pub mod error;
pub mod runner;
pub mod wait;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RunnerConfig, StakingWindow};
pub use error::{WaitTarget, WorkflowError};
pub use runner::{RpcWorkflowRunner, is_pending_import_error};
pub use wait::{WaitPolicy, wait_until};
