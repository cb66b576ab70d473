//! Per-operation fallback policy, kept apart from any transport.
//!
//! | operation            | remote ok            | remote failed       |
//! |----------------------|----------------------|---------------------|
//! | get_all / get_by_id  | remote result        | local read          |
//! | save / delete / bulk | local write          | local write         |
//! | import_all           | local replace        | local replace       |
//! | default_date         | remote value         | no default (`None`) |

use tracing::warn;

use crate::store::RemoteUnavailable;

/// Result of one attempt on the remote path.
#[derive(Debug)]
pub enum PathOutcome<T> {
    Ok(T),
    FallbackTriggered {
        operation: &'static str,
        reason: String,
    },
}

impl<T> PathOutcome<T> {
    pub fn from_remote(operation: &'static str, result: Result<T, RemoteUnavailable>) -> Self {
        match result {
            Ok(value) => PathOutcome::Ok(value),
            Err(e) => PathOutcome::FallbackTriggered {
                operation,
                reason: e.to_string(),
            },
        }
    }
}

/// What the facade does after the remote attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The remote answer stands; the local store is not consulted.
    Done(T),
    /// Run the local step and return its result.
    UseLocal,
}

/// Reads: the remote answer wins when there is one; no merging.
pub fn resolve_read<T>(outcome: PathOutcome<T>) -> Resolution<T> {
    match outcome {
        PathOutcome::Ok(value) => Resolution::Done(value),
        PathOutcome::FallbackTriggered { operation, reason } => {
            warn!("Remote {operation} unavailable, reading local store: {reason}");
            Resolution::UseLocal
        }
    }
}

/// Writes: the local store is the durability guarantee, so the local step
/// runs whatever the remote did.
pub fn resolve_write(outcome: PathOutcome<()>) -> Resolution<()> {
    if let PathOutcome::FallbackTriggered { operation, reason } = outcome {
        warn!("Remote {operation} failed, writing local store only: {reason}");
    }
    Resolution::UseLocal
}

/// Lookups without a local copy collapse failure into "no value".
pub fn resolve_optional<T>(outcome: PathOutcome<Option<T>>) -> Option<T> {
    match outcome {
        PathOutcome::Ok(value) => value,
        PathOutcome::FallbackTriggered { operation, reason } => {
            warn!("Remote {operation} unavailable, no value: {reason}");
            None
        }
    }
}
