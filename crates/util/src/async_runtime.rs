//! Async runtime helpers for blocking callers.
//!
//! This module provides a single entry point for executing async futures from
//! synchronous code paths, reusing the current Tokio runtime when available.

use std::{future::Future, thread};

use thiserror::Error;
use tokio::{
    runtime::{Builder, Handle, RuntimeFlavor},
    task,
};

/// Failure to obtain a runtime to drive a future on.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("could not build a Tokio runtime: {0}")]
    Build(#[from] std::io::Error),
    #[error("the thread driving the future panicked")]
    Panicked,
}

/// Execute an async future from synchronous code.
///
/// # Arguments
/// - `future`: The future to run to completion.
///
/// # Returns
/// Returns the future's output or an error if a Tokio runtime cannot be created.
///
/// # Notes
/// - Reuses the current runtime when it is multi-threaded.
/// - Inside a current-thread runtime, `block_in_place` is unavailable, so the
///   future is driven on a helper thread with its own runtime.
/// - Falls back to a single-threaded runtime for call sites outside Tokio.
pub fn block_on_future<F>(future: F) -> Result<F::Output, RuntimeError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => Ok(task::block_in_place(|| handle.block_on(future))),
        Ok(_) => thread::scope(|scope| {
            scope
                .spawn(|| run_on_fresh_runtime(future))
                .join()
                .map_err(|_| RuntimeError::Panicked)?
        }),
        Err(_) => run_on_fresh_runtime(future),
    }
}

fn run_on_fresh_runtime<F: Future>(future: F) -> Result<F::Output, RuntimeError> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}
