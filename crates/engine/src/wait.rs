//! Polling helpers for eventually consistent network state.
//!
//! Every wait in the runner has the same shape: query some state, stop when a
//! predicate holds, sleep a fixed interval otherwise, and give up with a
//! named timeout once the budget is spent. A failed query is terminal and is
//! never treated as "not ready yet".

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::{
    WorkflowError,
    clock::{Clock, elapsed_since},
};

/// Poll cadence and overall budget of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl WaitPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Poll `probe` until `is_ready` accepts its value or `policy.timeout` elapses.
///
/// Returns the first ready value. The first probe happens immediately, so a
/// condition that already holds returns without sleeping. When the budget is
/// spent, `on_timeout` receives the last observed value and builds the error.
/// The timeout is only declared once at least `policy.timeout` has elapsed.
pub fn wait_until<T, P, R, E>(clock: &dyn Clock, policy: WaitPolicy, mut probe: P, is_ready: R, on_timeout: E) -> Result<T, WorkflowError>
where
    P: FnMut() -> Result<T, WorkflowError>,
    R: Fn(&T) -> bool,
    E: FnOnce(T) -> WorkflowError,
{
    let started_at = clock.now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let observed = probe()?;
        if is_ready(&observed) {
            debug!(attempts, "wait condition satisfied");
            return Ok(observed);
        }

        let elapsed = elapsed_since(clock, started_at);
        if elapsed >= policy.timeout {
            warn!(attempts, elapsed_ms = elapsed.as_millis(), "wait timed out");
            return Err(on_timeout(observed));
        }

        trace!(attempts, "wait condition not yet satisfied");
        clock.sleep(policy.interval);
    }
}
