// ── Organization memberships ──
//
// A membership record links an organization to one site or one user and
// embeds that member's own record. The member is rebuilt as a standalone
// model on demand; its scope is the API root since sites and users are
// addressed by id alone.

use serde::Serialize;
use serde_json::Value;

use super::common::{Record, into_record, key_string};
use super::resource::{Model, ModelOptions, Resource};
use super::scope::{Scope, unsupported};
use super::site::Site;
use super::user::User;
use crate::config::TerminusConfig;
use crate::error::CoreError;

/// Pull the embedded member record out of a membership, giving it the
/// membership id when it carries none of its own.
fn embedded(
    record: &Record,
    field: &str,
    entity_type: &'static str,
    membership_id: &str,
) -> Result<Record, CoreError> {
    let value = record.get(field).cloned().unwrap_or(Value::Null);
    let mut nested = into_record(value, entity_type, membership_id).map_err(|_| {
        CoreError::InvalidRecord {
            entity_type,
            identifier: membership_id.to_owned(),
            reason: format!("membership has no {field} object"),
        }
    })?;
    nested
        .entry("id")
        .or_insert_with(|| Value::String(membership_id.to_owned()));
    Ok(nested)
}

fn role(record: &Record) -> Option<String> {
    record.get("role").and_then(Value::as_str).map(str::to_owned)
}

fn organization_path(
    scope: &Scope,
    members: &str,
    entity_type: &'static str,
) -> Result<String, CoreError> {
    match scope {
        Scope::Organization { org_id } => {
            Ok(format!("organizations/{org_id}/memberships/{members}"))
        }
        other => Err(unsupported(entity_type, other)),
    }
}

// ── Site memberships ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SiteMembership {
    pub role: Option<String>,
    site: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMembershipSummary {
    pub id: String,
    pub site_id: String,
    pub site_name: String,
    pub role: Option<String>,
}

impl Resource for SiteMembership {
    const KIND: &'static str = "site membership";
    type Summary = SiteMembershipSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let site = embedded(record, "site", Self::KIND, &options.id)?;
        // The embedded site must itself be a valid site record.
        Site::from_record(&site, &ModelOptions::new(options.id.clone(), Scope::Root))?;
        Ok(Self {
            role: role(record),
            site,
        })
    }

    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        organization_path(scope, "sites", Self::KIND)
    }

    fn summarize(model: &Model<Self>, _config: &TerminusConfig) -> SiteMembershipSummary {
        let membership = model.resource();
        SiteMembershipSummary {
            id: model.id().to_owned(),
            site_id: membership
                .site
                .get("id")
                .map(key_string)
                .unwrap_or_default(),
            site_name: membership
                .site
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            role: membership.role.clone(),
        }
    }
}

impl Model<SiteMembership> {
    pub fn role(&self) -> Option<&str> {
        self.resource().role.as_deref()
    }

    /// The member site as a standalone model.
    pub fn site(&self) -> Result<Model<Site>, CoreError> {
        Model::from_record(self.resource().site.clone(), Scope::Root)
    }
}

// ── User memberships ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UserMembership {
    pub role: Option<String>,
    user: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMembershipSummary {
    pub id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Resource for UserMembership {
    const KIND: &'static str = "user membership";
    type Summary = UserMembershipSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let user = embedded(record, "user", Self::KIND, &options.id)?;
        User::from_record(&user, &ModelOptions::new(options.id.clone(), Scope::Root))?;
        Ok(Self {
            role: role(record),
            user,
        })
    }

    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        organization_path(scope, "users", Self::KIND)
    }

    fn summarize(model: &Model<Self>, _config: &TerminusConfig) -> UserMembershipSummary {
        let membership = model.resource();
        UserMembershipSummary {
            id: model.id().to_owned(),
            user_id: membership
                .user
                .get("id")
                .map(key_string)
                .unwrap_or_default(),
            email: membership
                .user
                .get("email")
                .and_then(Value::as_str)
                .map(str::to_owned),
            role: membership.role.clone(),
        }
    }
}

impl Model<UserMembership> {
    pub fn role(&self) -> Option<&str> {
        self.resource().role.as_deref()
    }

    /// The member user as a standalone model.
    pub fn user(&self) -> Result<Model<User>, CoreError> {
        Model::from_record(self.resource().user.clone(), Scope::Root)
    }
}
