use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::agent::ActionEntry;
use crate::error::ToolError;

/// Result of one wrapped tool call. Always produced, whatever the tool did.
#[derive(Debug)]
pub struct ToolOutcome<T> {
    pub result: Option<T>,
    pub entry: ActionEntry,
    pub warning: Option<String>,
}

impl<T> ToolOutcome<T> {
    pub fn succeeded(&self) -> bool {
        self.result.is_some()
    }
}

/// Default bound on a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Call a tool exactly once, timing it on the monotonic clock.
///
/// The call runs on a worker thread and is given at most `timeout`.
/// Errors, panics and overruns are folded into a failed `tool` entry plus
/// a warning carrying the failure text. Nothing propagates to the caller.
/// An overrunning worker is detached; its eventual result is dropped.
pub fn invoke<T, F>(
    tool_name: &str,
    details: Map<String, Value>,
    timeout: Duration,
    call: F,
) -> ToolOutcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
{
    let started = Instant::now();
    let outcome = run_bounded(tool_name, timeout, call);
    let duration_ms = round_millis(started.elapsed());

    match outcome {
        Ok(result) => {
            tracing::debug!(tool = tool_name, duration_ms, "tool call succeeded");
            ToolOutcome {
                result: Some(result),
                entry: ActionEntry::tool(tool_name, true, duration_ms).with_details(details),
                warning: None,
            }
        }
        Err(err) => {
            tracing::warn!(tool = tool_name, duration_ms, error = %err, "tool call failed");
            ToolOutcome {
                result: None,
                entry: ActionEntry::tool(tool_name, false, duration_ms).with_details(details),
                warning: Some(format!("{tool_name} failed: {err}")),
            }
        }
    }
}

fn run_bounded<T, F>(tool_name: &str, timeout: Duration, call: F) -> Result<T, ToolError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name(format!("tool-{tool_name}"))
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
                Err(ToolError::Panicked(panic_message(payload.as_ref())))
            });
            // The receiver is gone once the caller has timed out.
            let _ = tx.send(result);
        })
        .map_err(|e| ToolError::Failed(format!("could not start tool worker: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ToolError::TimedOut(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(ToolError::Panicked(
            "tool worker exited without a result".to_string(),
        )),
    }
}

fn round_millis(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
