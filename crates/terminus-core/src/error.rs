// ── Core error types ──
//
// Domain errors raised by the resource layer. Gateway errors are wrapped
// transparently: callers see the transport failure exactly as the
// client reported it, and decide for themselves whether to retry.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller / data errors ─────────────────────────────────────────
    /// The caller asked for something the core cannot act on.
    #[error("{message}")]
    Validation { message: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A gateway record could not be turned into a typed model.
    #[error("Invalid {entity_type} record {identifier}: {reason}")]
    InvalidRecord {
        entity_type: &'static str,
        identifier: String,
        reason: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    /// A remote command exited non-zero. `output` is the captured output.
    #[error("{output}")]
    Process {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// A workflow reached the failed terminal state.
    #[error("Workflow {workflow} failed: {message}")]
    WorkflowFailed { workflow: String, message: String },

    #[error("Workflow {workflow} did not finish within {timeout_secs}s")]
    Timeout { workflow: String, timeout_secs: u64 },

    /// Spawning or talking to a local process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Gateway errors (passed through unmodified) ───────────────────
    #[error(transparent)]
    Api(#[from] terminus_api::Error),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a "not found" condition from either layer.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api(e) => e.is_not_found(),
            _ => false,
        }
    }
}
