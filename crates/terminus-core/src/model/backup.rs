// ── Backup: one archive in an environment's backup catalog ──
//
// Catalog ids look like `<schedule>_<archive type>_<kind>`. Everything a
// user sees (size, date, initiator) is derived from the raw storage
// metadata at read time; nothing is cached.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use terminus_api::{RequestOptions, TerminusClient};
use tracing::debug;

use super::common::{Record, decode, format_epoch};
use super::resource::{Model, ModelOptions, Resource};
use super::scope::{Scope, unsupported};
use super::workflow::Workflow;
use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::store::Collection;

/// Bucket used by the production platform.
pub const DEFAULT_BUCKET: &str = "pantheon-backups";

/// Default retention for on-demand backups, in days.
pub const DEFAULT_KEEP_FOR_DAYS: u32 = 365;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// What a backup archive contains, taken from the last `_` segment of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Code,
    Files,
    Database,
    /// Any other element name; such backups cannot be restored.
    Unknown,
}

impl BackupKind {
    fn from_element(element: &str) -> Self {
        element.parse().unwrap_or(Self::Unknown)
    }

    /// Workflow that restores an archive of this kind.
    fn restore_workflow(self) -> Option<&'static str> {
        match self {
            Self::Code => Some("restore_code"),
            Self::Files => Some("restore_files"),
            Self::Database => Some("restore_database"),
            Self::Unknown => None,
        }
    }
}

/// Who started a backup, taken from the suffix of its folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Initiator {
    Automated,
    Manual,
}

#[derive(Deserialize)]
struct BackupRecord {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    finish_time: Option<f64>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Backup {
    pub site_id: String,
    pub env_id: String,
    /// Raw archive size in bytes. Absent while the backup is running.
    pub size: Option<u64>,
    pub finish_time: Option<f64>,
    pub timestamp: Option<f64>,
    pub folder: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupSummary {
    pub file: Option<String>,
    pub size: String,
    pub date: String,
    pub initiator: Option<Initiator>,
}

impl Resource for Backup {
    const KIND: &'static str = "backup";
    type Summary = BackupSummary;

    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError> {
        let (site_id, env_id) = options.scope.require_environment(Self::KIND)?;
        let raw: BackupRecord = decode(record, Self::KIND, &options.id)?;
        Ok(Self {
            site_id: site_id.to_owned(),
            env_id: env_id.to_owned(),
            size: raw.size,
            finish_time: raw.finish_time,
            timestamp: raw.timestamp,
            folder: raw.folder,
            filename: raw.filename,
        })
    }

    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        match scope {
            Scope::Environment { site_id, env_id } => {
                Ok(format!("sites/{site_id}/environments/{env_id}/backups/catalog"))
            }
            other => Err(unsupported(Self::KIND, other)),
        }
    }

    fn summarize(model: &Model<Self>, config: &TerminusConfig) -> BackupSummary {
        BackupSummary {
            file: model.resource().filename.clone(),
            size: model.size_in_mb(),
            date: model.date(config),
            initiator: model.initiator().ok(),
        }
    }
}

/// Render a byte count the way backup listings show it.
///
/// Zero stays "0". Anything else is shown in MiB with one decimal place,
/// never less than "0.1MB".
pub fn format_size_mb(bytes: u64) -> String {
    if bytes == 0 {
        return "0".into();
    }
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let mb = (bytes as f64 / BYTES_PER_MB).max(0.1);
    format!("{mb:.1}MB")
}

impl Model<Backup> {
    /// The element segment of the id (`code`, `files`, `database`, ...).
    fn element(&self) -> &str {
        self.id().rsplit_once('_').map_or("", |(_, element)| element)
    }

    /// The id without its element segment: `<schedule>_<archive type>`.
    pub fn archive_name(&self) -> &str {
        self.id().rsplit_once('_').map_or(self.id(), |(name, _)| name)
    }

    pub fn kind(&self) -> BackupKind {
        BackupKind::from_element(self.element())
    }

    /// A backup is finished once it has a size and a completion time.
    pub fn is_finished(&self) -> bool {
        let b = self.resource();
        b.size.is_some() && (b.finish_time.is_some() || b.timestamp.is_some())
    }

    /// Completion date in the configured format, or "Pending".
    pub fn date(&self, config: &TerminusConfig) -> String {
        let b = self.resource();
        b.finish_time
            .or(b.timestamp)
            .and_then(|secs| format_epoch(secs, &config.date_format))
            .unwrap_or_else(|| "Pending".into())
    }

    pub fn size_in_mb(&self) -> String {
        format_size_mb(self.resource().size.unwrap_or(0))
    }

    pub fn initiator(&self) -> Result<Initiator, CoreError> {
        let folder = self.resource().folder.as_deref().unwrap_or_default();
        let suffix = folder.rsplit_once('_').map_or(folder, |(_, suffix)| suffix);
        suffix.parse().map_err(|_| {
            CoreError::validation(format!(
                "Cannot determine the initiator of backup {} from folder '{folder}'.",
                self.id()
            ))
        })
    }

    /// Storage bucket holding this environment's archives.
    pub fn bucket(&self, config: &TerminusConfig) -> String {
        match config.storage_host() {
            Some(host) => format!("{host}-{DEFAULT_BUCKET}"),
            None => DEFAULT_BUCKET.to_owned(),
        }
    }

    /// Start the restore workflow matching this backup's kind.
    ///
    /// The workflow runs on the owning environment; poll the returned
    /// handle to learn the outcome.
    pub async fn restore(
        &self,
        client: &TerminusClient,
        config: &TerminusConfig,
    ) -> Result<Model<Workflow>, CoreError> {
        let Some(workflow) = self.kind().restore_workflow() else {
            return Err(CoreError::validation("This backup has no archive to restore."));
        };
        let b = self.resource();
        let Some(filename) = b.filename.as_deref().filter(|f| !f.is_empty()) else {
            return Err(CoreError::validation("This backup has no archive file to restore."));
        };
        let key = format!(
            "{}/{}/{}/{filename}",
            b.site_id,
            b.env_id,
            self.archive_name(),
        );
        let params = json!({ "key": key, "bucket": self.bucket(config) });
        Collection::<Workflow>::new(Scope::environment(&b.site_id, &b.env_id))
            .create(client, workflow, params)
            .await
    }

    /// A signed, time-limited download URL for the archive.
    pub async fn url(&self, client: &TerminusClient) -> Result<String, CoreError> {
        let b = self.resource();
        let path = format!(
            "sites/{}/environments/{}/backups/catalog/{}/{}/s3token",
            b.site_id,
            b.env_id,
            b.folder.as_deref().unwrap_or_default(),
            self.element()
        );
        debug!(backup = %self.id(), "requesting download url");
        let resp = client
            .request(&path, RequestOptions::post(json!({ "method": "get" })))
            .await?;
        resp.data
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| CoreError::InvalidRecord {
                entity_type: Backup::KIND,
                identifier: self.id().to_owned(),
                reason: "s3token response has no url".into(),
            })
    }
}

/// Which archives an on-demand backup should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupElement {
    All,
    Only(BackupKind),
}

impl Collection<Backup> {
    /// Finished backups in listing order.
    pub fn finished(&self) -> Vec<&Model<Backup>> {
        self.all().filter(|b| b.is_finished()).collect()
    }

    /// Finished backups of one kind, in listing order.
    pub fn by_kind(&self, kind: BackupKind) -> Vec<&Model<Backup>> {
        self.all()
            .filter(|b| b.is_finished() && b.kind() == kind)
            .collect()
    }

    /// Start an on-demand backup kept for `keep_for_days`
    /// (default [`DEFAULT_KEEP_FOR_DAYS`]).
    pub async fn create(
        &self,
        client: &TerminusClient,
        element: BackupElement,
        keep_for_days: Option<u32>,
    ) -> Result<Model<Workflow>, CoreError> {
        let (site_id, env_id) = self.scope().require_environment(Backup::KIND)?;
        let wants = |kind: BackupKind| match element {
            BackupElement::All => true,
            BackupElement::Only(only) => only == kind,
        };
        if element == BackupElement::Only(BackupKind::Unknown) {
            return Err(CoreError::validation(
                "Backup element must be code, files or database.",
            ));
        }
        let ttl = u64::from(keep_for_days.unwrap_or(DEFAULT_KEEP_FOR_DAYS)) * 86_400;
        let params = json!({
            "code": wants(BackupKind::Code),
            "database": wants(BackupKind::Database),
            "files": wants(BackupKind::Files),
            "ttl": ttl,
            "entry_type": "backup",
        });
        Collection::<Workflow>::new(Scope::environment(site_id, env_id))
            .create(client, "do_export", params)
            .await
    }
}
