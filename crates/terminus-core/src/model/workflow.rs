// ── Workflow: handle to an asynchronous server-side operation ──
//
// Creating a workflow returns as soon as the platform has accepted it.
// `check_progress` is a bare polling primitive: one refetch, no sleeping,
// no retry. Status only ever moves forward; once terminal the handle
// stops talking to the server.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use terminus_api::{RequestOptions, TerminusClient};
use tracing::debug;

use super::common::{Record, decode, format_epoch, into_record};
use super::resource::{Model, ModelOptions, Resource};
use super::scope::{Scope, unsupported};
use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::store::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Succeeded,
    Failed,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Map the platform's `result` field. `aborted` counts as failed.
    fn from_result(result: Option<&str>) -> Self {
        match result {
            Some("succeeded") => Self::Succeeded,
            Some("failed" | "aborted") => Self::Failed,
            _ => Self::Running,
        }
    }
}

/// One step of a workflow's structured log.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkflowOperation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub log_output: Option<String>,
}

impl WorkflowOperation {
    pub fn failed(&self) -> bool {
        matches!(self.result.as_deref(), Some("failed" | "aborted"))
    }
}

#[derive(Deserialize)]
struct WorkflowRecord {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    operations: Vec<WorkflowOperation>,
    #[serde(default)]
    started_at: Option<f64>,
    #[serde(default)]
    finished_at: Option<f64>,
    #[serde(default)]
    final_task: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Workflow {
    pub kind: String,
    pub description: String,
    pub status: WorkflowStatus,
    pub reason: Option<String>,
    pub environment: Option<String>,
    pub operations: Vec<WorkflowOperation>,
    pub started_at: Option<f64>,
    pub finished_at: Option<f64>,
    /// The platform's record of the last task run, when reported.
    pub final_task: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub env: Option<String>,
    pub workflow: String,
    pub status: WorkflowStatus,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl Resource for Workflow {
    const KIND: &'static str = "workflow";
    type Summary = WorkflowSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let raw: WorkflowRecord = decode(record, Self::KIND, &options.id)?;
        Ok(Self {
            status: WorkflowStatus::from_result(raw.result.as_deref()),
            description: raw.description.unwrap_or_else(|| raw.kind.clone()),
            kind: raw.kind,
            reason: raw.reason,
            environment: raw
                .environment
                .or_else(|| options.scope.env_id().map(str::to_owned)),
            operations: raw.operations,
            started_at: raw.started_at,
            finished_at: raw.finished_at,
            final_task: raw.final_task,
        })
    }

    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        match scope {
            Scope::Root => Err(unsupported(Self::KIND, scope)),
            other => Ok(format!("{other}/workflows")),
        }
    }

    /// Site and environment workflows are both read back through the site.
    fn detail_path(scope: &Scope, id: &str) -> Result<String, CoreError> {
        match scope {
            Scope::Site { site_id } | Scope::Environment { site_id, .. } => {
                Ok(format!("sites/{site_id}/workflows/{id}"))
            }
            other => Ok(format!("{}/{id}", Self::collection_path(other)?)),
        }
    }

    /// Status never leaves a terminal state, whatever a later read says.
    fn refreshed(mut self, previous: &Self) -> Self {
        if previous.status.is_terminal() {
            self.status = previous.status;
        }
        self
    }

    fn summarize(model: &Model<Self>, config: &TerminusConfig) -> WorkflowSummary {
        let wf = model.resource();
        let date = |t: Option<f64>| t.and_then(|secs| format_epoch(secs, &config.date_format));
        WorkflowSummary {
            id: model.id().to_owned(),
            env: wf.environment.clone(),
            workflow: wf.description.clone(),
            status: wf.status,
            started_at: date(wf.started_at),
            finished_at: date(wf.finished_at),
        }
    }
}

impl Model<Workflow> {
    pub fn kind(&self) -> &str {
        &self.resource().kind
    }

    pub fn status(&self) -> WorkflowStatus {
        self.resource().status
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn is_successful(&self) -> bool {
        self.status() == WorkflowStatus::Succeeded
    }

    pub fn operations(&self) -> &[WorkflowOperation] {
        &self.resource().operations
    }

    /// Refetch the workflow and report whether it is terminal.
    ///
    /// Returns `true` straight away, without a request, once a terminal
    /// status has been observed.
    pub async fn check_progress(&mut self, client: &TerminusClient) -> Result<bool, CoreError> {
        if self.is_finished() {
            return Ok(true);
        }
        self.fetch(client).await?;
        debug!(id = %self.id(), status = %self.status(), "workflow progress");
        Ok(self.is_finished())
    }

    /// Human-readable summary of why a failed workflow failed.
    ///
    /// Built from the failed operations' log output, falling back to the
    /// workflow's own reason. `None` unless the workflow failed.
    pub fn failure_message(&self) -> Option<String> {
        if self.status() != WorkflowStatus::Failed {
            return None;
        }
        let wf = self.resource();
        let lines: Vec<String> = wf
            .operations
            .iter()
            .filter(|op| op.failed())
            .map(|op| match op.log_output.as_deref().map(str::trim) {
                Some(log) if !log.is_empty() => format!("{}: {log}", op.description),
                _ => format!("{} failed", op.description),
            })
            .collect();
        if !lines.is_empty() {
            return Some(lines.join("\n"));
        }
        let reason = wf.reason.clone().or_else(|| {
            wf.final_task
                .as_ref()
                .and_then(|task| task.get("reason"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        });
        Some(reason.unwrap_or_else(|| format!("{} failed.", wf.description)))
    }

    /// Turn a failed terminal state into [`CoreError::WorkflowFailed`].
    pub fn ensure_succeeded(&self) -> Result<(), CoreError> {
        match self.failure_message() {
            Some(message) => Err(CoreError::WorkflowFailed {
                workflow: self.kind().to_owned(),
                message,
            }),
            None => Ok(()),
        }
    }
}

impl Collection<Workflow> {
    /// Start a server-side operation of type `kind`.
    ///
    /// The returned handle is not inserted into the collection. The
    /// operation keeps running on the platform whether or not the handle
    /// is ever polled.
    pub async fn create(
        &self,
        client: &TerminusClient,
        kind: &str,
        params: Value,
    ) -> Result<Model<Workflow>, CoreError> {
        let path = Workflow::collection_path(self.scope())?;
        let params = if params.is_null() { json!({}) } else { params };
        debug!(workflow = kind, scope = %self.scope(), "creating workflow");
        let resp = client
            .request(
                &path,
                RequestOptions::post(json!({ "type": kind, "params": params })),
            )
            .await?;
        let record = into_record(resp.data, Workflow::KIND, kind)?;
        self.add(record, Record::new())
    }
}
