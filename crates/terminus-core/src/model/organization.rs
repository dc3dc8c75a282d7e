// ── Organization domain type ──

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use terminus_api::{RequestOptions, TerminusClient};
use tracing::debug;

use super::common::{Record, decode};
use super::membership::{SiteMembership, UserMembership};
use super::resource::{Model, ModelOptions, Resource};
use super::scope::{Scope, unsupported};
use super::site::Site;
use super::user::User;
use super::workflow::Workflow;
use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::store::Collection;

#[derive(Debug, Clone, Default, Deserialize)]
struct Profile {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct OrganizationRecord {
    #[serde(default)]
    profile: Option<Profile>,
    /// User membership listings nest the organization itself.
    #[serde(default)]
    organization: Option<Box<OrganizationRecord>>,
}

impl OrganizationRecord {
    fn into_profile(self) -> Profile {
        match (self.profile, self.organization) {
            (Some(profile), _) => profile,
            (None, Some(nested)) => nested.into_profile(),
            (None, None) => Profile::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Organization {
    /// Display name from the organization profile.
    pub name: Option<String>,
    /// Feature flags, loaded on first lookup and dropped on refetch.
    features: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationSummary {
    pub id: String,
    pub name: Option<String>,
}

impl Resource for Organization {
    const KIND: &'static str = "organization";
    type Summary = OrganizationSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let raw: OrganizationRecord = decode(record, Self::KIND, &options.id)?;
        Ok(Self {
            name: raw.into_profile().name,
            features: None,
        })
    }

    /// Organizations are listed through the memberships of one user.
    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        match scope {
            Scope::User { user_id } => Ok(format!("users/{user_id}/memberships/organizations")),
            other => Err(unsupported(Self::KIND, other)),
        }
    }

    fn detail_path(_scope: &Scope, id: &str) -> Result<String, CoreError> {
        Ok(format!("organizations/{id}"))
    }

    fn summarize(model: &Model<Self>, _config: &TerminusConfig) -> OrganizationSummary {
        OrganizationSummary {
            id: model.id().to_owned(),
            name: model.resource().name.clone(),
        }
    }
}

impl Model<Organization> {
    pub fn name(&self) -> Option<&str> {
        self.resource().name.as_deref()
    }

    /// Value of one feature flag, or `None` if the organization lacks it.
    ///
    /// The whole feature map is requested once and cached on the model.
    pub async fn feature(
        &mut self,
        client: &TerminusClient,
        name: &str,
    ) -> Result<Option<Value>, CoreError> {
        if self.resource().features.is_none() {
            let path = format!("organizations/{}/features", self.id());
            debug!(org = %self.id(), "loading feature flags");
            let resp = client.request(&path, RequestOptions::get()).await?;
            let features = match resp.data {
                Value::Object(map) => map,
                data if data.is_null() || data.as_array().is_some_and(Vec::is_empty) => {
                    Record::new()
                }
                _ => {
                    return Err(CoreError::InvalidRecord {
                        entity_type: Organization::KIND,
                        identifier: self.id().to_owned(),
                        reason: "feature listing is not an object".into(),
                    });
                }
            };
            self.resource_mut().features = Some(features);
        }
        Ok(self
            .resource()
            .features
            .as_ref()
            .and_then(|features| features.get(name))
            .cloned())
    }

    /// A new, unfetched collection of this organization's workflows.
    pub fn workflows(&self) -> Collection<Workflow> {
        Collection::new(Scope::organization(self.id()))
    }

    pub fn site_memberships(&self) -> Collection<SiteMembership> {
        Collection::new(Scope::organization(self.id()))
    }

    pub fn user_memberships(&self) -> Collection<UserMembership> {
        Collection::new(Scope::organization(self.id()))
    }

    /// Member sites keyed by site id, in listing order.
    pub async fn sites(
        &self,
        client: &TerminusClient,
    ) -> Result<IndexMap<String, Model<Site>>, CoreError> {
        let mut memberships = self.site_memberships();
        memberships.fetch(client).await?;
        memberships
            .all()
            .map(|membership| {
                membership
                    .site()
                    .map(|site| (site.id().to_owned(), site))
            })
            .collect()
    }

    /// Member users keyed by user id, in listing order.
    pub async fn users(
        &self,
        client: &TerminusClient,
    ) -> Result<IndexMap<String, Model<User>>, CoreError> {
        let mut memberships = self.user_memberships();
        memberships.fetch(client).await?;
        memberships
            .all()
            .map(|membership| {
                membership
                    .user()
                    .map(|user| (user.id().to_owned(), user))
            })
            .collect()
    }
}
