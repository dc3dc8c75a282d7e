// ── Resource models ──
//
// One module per remote resource kind, plus the generic machinery they
// share. A kind implements `Resource`; its behaviour lives in an inherent
// `impl Model<Kind>` block next to it.

pub mod common;
pub mod resource;
pub mod scope;

pub mod backup;
pub mod environment;
pub mod membership;
pub mod organization;
pub mod site;
pub mod user;
pub mod workflow;

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::Record;
pub use resource::{Model, ModelOptions, Resource};
pub use scope::{Scope, SiteEnv};

pub use backup::{
    Backup, BackupElement, BackupKind, BackupSummary, DEFAULT_BUCKET, DEFAULT_KEEP_FOR_DAYS,
    Initiator, format_size_mb,
};
pub use environment::{ConnectionMode, Environment, EnvironmentSummary};
pub use membership::{
    SiteMembership, SiteMembershipSummary, UserMembership, UserMembershipSummary,
};
pub use organization::{Organization, OrganizationSummary};
pub use site::{Site, SiteSummary};
pub use user::{User, UserSummary};
pub use workflow::{Workflow, WorkflowOperation, WorkflowStatus, WorkflowSummary};
