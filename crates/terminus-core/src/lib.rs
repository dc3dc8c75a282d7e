//! Resource and operation layer between `terminus-api` and command code.
//!
//! - **Models and collections** ([`Model`], [`Collection`]): typed wrappers
//!   around gateway records. A collection mirrors one listing response in
//!   server order; a model refetches its own detail record on demand.
//!
//! - **Workflows** ([`Workflow`]): handles to long-running server-side
//!   operations. [`Model::<Workflow>::check_progress`](Model::check_progress)
//!   is a single refetch; [`wait_for_workflow`] layers an interval and a
//!   deadline on top for callers that want to block.
//!
//! - **Environments** ([`Environment`]): commit, mode switching, and remote
//!   command execution through a [`RemoteExecutor`], gated and audited by
//!   connection mode.
//!
//! - **Backups** ([`Backup`]): display values derived from catalog metadata,
//!   restore dispatch by archive kind, download URLs.
//!
//! Everything runs one request at a time on the caller's task. Nothing here
//! spawns, retries, or caches across invocations.

pub mod config;
pub mod error;
pub mod exec;
pub mod model;
pub mod poll;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_DATE_FORMAT, DEFAULT_HOST, TerminusConfig};
pub use error::CoreError;
pub use exec::{CommandOutput, RemoteExecutor, SSH_PORT, SshExecutor, SshTarget};
pub use poll::{PollPolicy, wait_for_workflow};
pub use store::Collection;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Generic machinery
    Model, ModelOptions, Record, Resource, Scope, SiteEnv,
    // Sites and environments
    ConnectionMode, Environment, EnvironmentSummary, Site, SiteSummary,
    // Organizations and their members
    Organization, OrganizationSummary, SiteMembership, SiteMembershipSummary, User,
    UserMembership, UserMembershipSummary, UserSummary,
    // Workflows
    Workflow, WorkflowOperation, WorkflowStatus, WorkflowSummary,
    // Backups
    Backup, BackupElement, BackupKind, BackupSummary, Initiator, format_size_mb,
};
