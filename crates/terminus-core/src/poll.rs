// ── Caller-side workflow polling ──
//
// `Model<Workflow>::check_progress` is a single refetch. This module wraps
// it in a loop with an explicit interval and optional deadline for callers
// that want to block on completion. Dropping the future stops polling
// only; the platform keeps running the operation.

use std::time::Duration;

use terminus_api::TerminusClient;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Model, Workflow};

/// How often, and for how long, to poll a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between progress checks.
    pub interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: None,
        }
    }
}

impl PollPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Poll `workflow` until it is terminal.
///
/// Returns `Ok(())` on success, [`CoreError::WorkflowFailed`] when the
/// workflow failed, and [`CoreError::Timeout`] when the deadline passes
/// first. Transport errors end the wait immediately; nothing is retried.
pub async fn wait_for_workflow(
    client: &TerminusClient,
    workflow: &mut Model<Workflow>,
    policy: &PollPolicy,
) -> Result<(), CoreError> {
    let deadline = policy.timeout.map(|t| Instant::now() + t);

    loop {
        if workflow.check_progress(client).await? {
            debug!(id = %workflow.id(), status = %workflow.status(), "workflow finished");
            return workflow.ensure_succeeded();
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CoreError::Timeout {
                workflow: workflow.kind().to_owned(),
                timeout_secs: policy.timeout.map_or(0, |t| t.as_secs()),
            });
        }
        // A zero interval re-checks immediately.
        tokio::time::sleep(policy.interval).await;
    }
}
