// ── User domain type ──

use serde::{Deserialize, Serialize};

use super::common::{Record, decode};
use super::organization::Organization;
use super::resource::{Model, ModelOptions, Resource};
use super::scope::Scope;
use super::workflow::Workflow;
use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::store::Collection;

#[derive(Debug, Clone, Default, Deserialize)]
struct UserProfile {
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    profile: UserProfile,
}

#[derive(Debug, Clone)]
pub struct User {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Resource for User {
    const KIND: &'static str = "user";
    type Summary = UserSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let raw: UserRecord = decode(record, Self::KIND, &options.id)?;
        Ok(Self {
            email: raw.email,
            first_name: raw.profile.firstname,
            last_name: raw.profile.lastname,
        })
    }

    fn detail_path(_scope: &Scope, id: &str) -> Result<String, CoreError> {
        Ok(format!("users/{id}"))
    }

    fn summarize(model: &Model<Self>, _config: &TerminusConfig) -> UserSummary {
        let user = model.resource();
        UserSummary {
            id: model.id().to_owned(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl Model<User> {
    pub fn email(&self) -> Option<&str> {
        self.resource().email.as_deref()
    }

    /// "First Last", skipping whichever half is missing.
    pub fn full_name(&self) -> String {
        let user = self.resource();
        [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A new, unfetched collection of the organizations this user belongs to.
    pub fn organizations(&self) -> Collection<Organization> {
        Collection::new(Scope::user(self.id()))
    }

    pub fn workflows(&self) -> Collection<Workflow> {
        Collection::new(Scope::user(self.id()))
    }
}
