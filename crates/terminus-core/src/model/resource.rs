// ── Generic resource model ──
//
// `Model<R>` wraps one gateway record: the raw attribute set, a typed view
// decoded from it, and the scope of the collection it came from. Each
// resource kind implements `Resource` to say where it lives on the API,
// how its record is validated, and what its display summary looks like.

use serde::Serialize;
use serde_json::Value;
use terminus_api::{RequestOptions, TerminusClient};
use tracing::debug;

use super::common::{Record, into_record, key_string};
use super::scope::{Scope, unsupported};
use crate::config::TerminusConfig;
use crate::error::CoreError;

/// A kind of remote resource.
pub trait Resource: Sized {
    /// Name used in errors and logs ("backup", "environment", ...).
    const KIND: &'static str;

    /// Display-ready projection produced by [`Model::serialize`].
    type Summary: Serialize;

    /// Validate a record and build the typed view.
    ///
    /// Called for every construction and every refetch; an error leaves
    /// the model (or collection) untouched.
    fn from_record(record: &Record, options: &ModelOptions) -> Result<Self, CoreError>;

    /// Listing endpoint of a collection under `scope`.
    fn collection_path(scope: &Scope) -> Result<String, CoreError> {
        Err(unsupported(Self::KIND, scope))
    }

    /// Canonical detail endpoint for one id.
    fn detail_path(scope: &Scope, id: &str) -> Result<String, CoreError> {
        Ok(format!("{}/{id}", Self::collection_path(scope)?))
    }

    /// Reconcile a freshly decoded view with the one it is replacing.
    ///
    /// Runs on every refetch, after validation. The default keeps the new
    /// view as is.
    fn refreshed(self, _previous: &Self) -> Self {
        self
    }

    fn summarize(model: &Model<Self>, config: &TerminusConfig) -> Self::Summary;
}

/// Contextual options handed to the factory along with the record.
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub id: String,
    pub scope: Scope,
    /// Caller-supplied extras, kept on the model as its context.
    pub extra: Record,
}

impl ModelOptions {
    pub fn new(id: impl Into<String>, scope: Scope) -> Self {
        Self {
            id: id.into(),
            scope,
            extra: Record::new(),
        }
    }
}

/// One resource record plus its typed view.
#[derive(Debug, Clone)]
pub struct Model<R> {
    id: String,
    attributes: Record,
    resource: R,
    fetched: bool,
    scope: Scope,
    context: Record,
}

impl<R: Resource> Model<R> {
    /// Build a model from a record through the resource factory.
    ///
    /// The record gains an `id` attribute when it lacks one, so that
    /// listings keyed on `id` see every member.
    pub fn new(mut record: Record, options: ModelOptions) -> Result<Self, CoreError> {
        record
            .entry("id")
            .or_insert_with(|| Value::String(options.id.clone()));
        let resource = R::from_record(&record, &options)?;
        Ok(Self {
            id: options.id,
            attributes: record,
            resource,
            fetched: false,
            scope: options.scope,
            context: options.extra,
        })
    }

    /// Build a model from a record that carries its own `id`.
    pub fn from_record(record: Record, scope: Scope) -> Result<Self, CoreError> {
        let id = record_id::<R>(&record)?;
        Self::new(record, ModelOptions::new(id, scope))
    }

    /// Fetch one record from its detail endpoint and wrap it.
    pub async fn get(
        client: &TerminusClient,
        scope: Scope,
        id: &str,
    ) -> Result<Self, CoreError> {
        let path = R::detail_path(&scope, id)?;
        debug!(kind = R::KIND, %path, "fetching model");
        let resp = client.request(&path, RequestOptions::get()).await?;
        let record = into_record(resp.data, R::KIND, id)?;
        let mut model = Self::new(record, ModelOptions::new(id, scope))?;
        model.fetched = true;
        Ok(model)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn attributes(&self) -> &Record {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub(crate) fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    /// Extra options the model was constructed with.
    pub fn context(&self) -> &Record {
        &self.context
    }

    /// Whether the attribute set came from the detail endpoint.
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    /// Replace the attribute set with the server's detail record.
    ///
    /// On any failure the current attributes stay as they were.
    pub async fn fetch(&mut self, client: &TerminusClient) -> Result<&mut Self, CoreError> {
        let path = R::detail_path(&self.scope, &self.id)?;
        debug!(kind = R::KIND, id = %self.id, %path, "refreshing model");
        let resp = client.request(&path, RequestOptions::get()).await?;
        self.replace(resp.data)?;
        Ok(self)
    }

    /// Swap in a new record after validating it.
    pub(crate) fn replace(&mut self, data: Value) -> Result<(), CoreError> {
        let mut record = into_record(data, R::KIND, &self.id)?;
        record
            .entry("id")
            .or_insert_with(|| Value::String(self.id.clone()));
        let options = ModelOptions {
            id: self.id.clone(),
            scope: self.scope.clone(),
            extra: self.context.clone(),
        };
        self.resource = R::from_record(&record, &options)?.refreshed(&self.resource);
        self.attributes = record;
        self.fetched = true;
        Ok(())
    }

    /// Project into the per-type display structure.
    pub fn serialize(&self, config: &TerminusConfig) -> R::Summary {
        R::summarize(self, config)
    }
}

/// The `id` attribute of a record that must carry one.
pub(crate) fn record_id<R: Resource>(record: &Record) -> Result<String, CoreError> {
    match record.get("id") {
        Some(Value::Null) | None => Err(CoreError::InvalidRecord {
            entity_type: R::KIND,
            identifier: "<unknown>".into(),
            reason: "record has no id".into(),
        }),
        Some(id) => Ok(key_string(id)),
    }
}
