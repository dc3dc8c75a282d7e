// ── Environment: a deployable, addressable copy of a site ──
//
// Environments gate remote command execution on their connection mode,
// and start commit / mode-switch operations as workflows.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use terminus_api::{RequestOptions, TerminusClient};
use tracing::{info, warn};

use super::backup::Backup;
use super::common::{Record, decode};
use super::resource::{Model, ModelOptions, Resource};
use super::scope::{Scope, unsupported};
use super::site::Site;
use super::workflow::Workflow;
use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::exec::{RemoteExecutor, SshTarget};
use crate::store::Collection;

const GIT_MODE_WARNING: &str = "This environment is in read-only Git mode. If you want to make \
    changes to the codebase of this site (e.g. updating modules or plugins), you will need to \
    toggle into read/write SFTP mode first.";

/// How code reaches the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Read/write on-server development.
    Sftp,
    /// Read-only; code arrives by git push.
    Git,
}

#[derive(Deserialize)]
struct EnvironmentRecord {
    #[serde(default)]
    connection_mode: Option<String>,
    #[serde(default)]
    on_server_development: Option<bool>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    environment_created: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Environment {
    pub site_id: String,
    pub connection_mode: ConnectionMode,
    pub domain: Option<String>,
    pub created: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSummary {
    pub id: String,
    pub domain: Option<String>,
    pub connection_mode: ConnectionMode,
    pub initialized: bool,
}

impl Resource for Environment {
    const KIND: &'static str = "environment";
    type Summary = EnvironmentSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let site_id = options.scope.require_site(Self::KIND)?.to_owned();
        let raw: EnvironmentRecord = decode(record, Self::KIND, &options.id)?;

        let connection_mode = match (raw.connection_mode, raw.on_server_development) {
            (Some(mode), _) => mode.parse().map_err(|_| CoreError::InvalidRecord {
                entity_type: Self::KIND,
                identifier: options.id.clone(),
                reason: format!("unknown connection mode '{mode}'"),
            })?,
            (None, Some(true)) => ConnectionMode::Sftp,
            (None, _) => ConnectionMode::Git,
        };

        Ok(Self {
            site_id,
            connection_mode,
            domain: raw.domain,
            created: raw.environment_created,
        })
    }

    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        match scope {
            Scope::Site { site_id } => Ok(format!("sites/{site_id}/environments")),
            other => Err(unsupported(Self::KIND, other)),
        }
    }

    fn summarize(model: &Model<Self>, _config: &TerminusConfig) -> EnvironmentSummary {
        let env = model.resource();
        EnvironmentSummary {
            id: model.id().to_owned(),
            domain: env.domain.clone(),
            connection_mode: env.connection_mode,
            initialized: env.created.is_some(),
        }
    }
}

impl Model<Environment> {
    pub fn site_id(&self) -> &str {
        &self.resource().site_id
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.resource().connection_mode
    }

    /// Scope of collections owned by this environment.
    pub fn child_scope(&self) -> Scope {
        Scope::environment(self.site_id(), self.id())
    }

    /// A new, unfetched collection of this environment's workflows.
    pub fn workflows(&self) -> Collection<Workflow> {
        Collection::new(self.child_scope())
    }

    /// A new, unfetched collection of this environment's backups.
    pub fn backups(&self) -> Collection<Backup> {
        Collection::new(self.child_scope())
    }

    pub fn ssh_target(&self) -> SshTarget {
        SshTarget::for_environment(self.site_id(), self.id())
    }

    fn owner_path(&self) -> String {
        format!("sites/{}/environments/{}", self.site_id(), self.id())
    }

    /// Uncommitted on-server changes, keyed by file path.
    pub async fn diffstat(&self, client: &TerminusClient) -> Result<Record, CoreError> {
        let path = format!("{}/on-server-development/diffstat", self.owner_path());
        let resp = client.request(&path, RequestOptions::get()).await?;
        match resp.data {
            Value::Object(map) => Ok(map),
            // An empty diffstat arrives as `[]`.
            other if other.is_null() || other.as_array().is_some_and(Vec::is_empty) => {
                Ok(Record::new())
            }
            _ => Err(CoreError::InvalidRecord {
                entity_type: Environment::KIND,
                identifier: self.id().to_owned(),
                reason: "diffstat is not a mapping".into(),
            }),
        }
    }

    /// Commit pending on-server changes.
    ///
    /// Returns `None`, after a warning, when there is nothing to commit.
    /// Otherwise returns the commit workflow, which the caller must poll.
    pub async fn commit_changes(
        &self,
        client: &TerminusClient,
        message: &str,
    ) -> Result<Option<Model<Workflow>>, CoreError> {
        let changes = self.diffstat(client).await?;
        if changes.is_empty() {
            warn!(site = %self.site_id(), env = %self.id(), "There is no code to commit.");
            return Ok(None);
        }

        let workflow = self
            .workflows()
            .create(
                client,
                "commit_and_push_on_server_changes",
                json!({ "message": message }),
            )
            .await?;
        Ok(Some(workflow))
    }

    /// Switch between SFTP and Git mode.
    ///
    /// Returns `None`, after a warning, when already in `mode`.
    pub async fn change_connection_mode(
        &self,
        client: &TerminusClient,
        mode: ConnectionMode,
    ) -> Result<Option<Model<Workflow>>, CoreError> {
        if self.connection_mode() == mode {
            warn!(env = %self.id(), %mode, "The connection mode is already set to {mode}.");
            return Ok(None);
        }
        let kind = match mode {
            ConnectionMode::Sftp => "enable_on_server_development",
            ConnectionMode::Git => "disable_on_server_development",
        };
        let workflow = self.workflows().create(client, kind, json!({})).await?;
        Ok(Some(workflow))
    }

    /// Run `command` on this environment's application server.
    ///
    /// Git mode only earns a warning; the command still runs. Every run
    /// leaves one audit notice with the exit code. A non-zero exit is a
    /// [`CoreError::Process`] carrying the captured output.
    pub async fn execute_command<E: RemoteExecutor>(
        &self,
        executor: &E,
        site: &Model<Site>,
        command: &str,
    ) -> Result<String, CoreError> {
        if self.connection_mode() != ConnectionMode::Sftp {
            warn!("{GIT_MODE_WARNING}");
        }

        let result = executor.run(&self.ssh_target(), command).await?;

        let quoted = format!("'{command}'");
        info!(
            site = %site.name(),
            env = %self.id(),
            command = %quoted,
            exit = result.exit_code,
            "Command: {}.{} -- {} [Exit: {}]",
            site.name(),
            self.id(),
            quoted,
            result.exit_code,
        );

        if result.exit_code != 0 {
            return Err(CoreError::Process {
                command: command.to_owned(),
                exit_code: result.exit_code,
                output: result.output,
            });
        }
        Ok(result.output)
    }
}
