// ── Site domain type ──

use serde::{Deserialize, Serialize};

use super::common::{Record, decode};
use super::environment::Environment;
use super::resource::{Model, ModelOptions, Resource};
use super::scope::Scope;
use super::workflow::Workflow;
use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::store::Collection;

#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    /// Machine name (e.g., "my-site"), the first half of a locator.
    pub name: String,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    pub id: String,
    pub name: String,
    pub framework: Option<String>,
    pub frozen: bool,
}

impl Resource for Site {
    const KIND: &'static str = "site";
    type Summary = SiteSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        decode(record, Self::KIND, &options.id)
    }

    /// Sites are addressed by id alone, whatever collection they came from.
    fn detail_path(_scope: &Scope, id: &str) -> Result<String, CoreError> {
        Ok(format!("sites/{id}"))
    }

    fn summarize(model: &Model<Self>, _config: &TerminusConfig) -> SiteSummary {
        let site = model.resource();
        SiteSummary {
            id: model.id().to_owned(),
            name: site.name.clone(),
            framework: site.framework.clone(),
            frozen: site.frozen,
        }
    }
}

impl Model<Site> {
    pub fn name(&self) -> &str {
        &self.resource().name
    }

    pub fn is_frozen(&self) -> bool {
        self.resource().frozen
    }

    /// A new, unfetched collection of this site's environments.
    pub fn environments(&self) -> Collection<Environment> {
        Collection::new(Scope::site(self.id()))
    }

    /// A new, unfetched collection of this site's workflows.
    pub fn workflows(&self) -> Collection<Workflow> {
        Collection::new(Scope::site(self.id()))
    }
}
