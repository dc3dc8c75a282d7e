// ── Generic ordered resource collection ──
//
// Membership mirrors one listing response: ids in server order, one model
// per record. A fetch builds the complete new membership before swapping
// it in, so a failed fetch never leaves a half-populated collection.

use indexmap::IndexMap;
use serde_json::Value;
use terminus_api::{RequestOptions, TerminusClient};
use tracing::debug;

use crate::config::TerminusConfig;
use crate::error::CoreError;
use crate::model::common::{Record, into_record, key_string, matches_all};
use crate::model::resource::record_id;
use crate::model::{Model, ModelOptions, Resource, Scope};

/// Ordered id → model mapping for one resource kind under one scope.
#[derive(Debug, Clone)]
pub struct Collection<R> {
    scope: Scope,
    members: IndexMap<String, Model<R>>,
    fetched: bool,
}

impl<R: Resource> Collection<R> {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            members: IndexMap::new(),
            fetched: false,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether a listing has been loaded since construction.
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    /// Load the full listing, replacing the current membership.
    pub async fn fetch(&mut self, client: &TerminusClient) -> Result<&mut Self, CoreError> {
        let path = R::collection_path(&self.scope)?;
        debug!(kind = R::KIND, %path, "fetching collection");
        let resp = client.request(&path, RequestOptions::get()).await?;
        self.replace(resp.data)?;
        debug!(kind = R::KIND, count = self.members.len(), "collection loaded");
        Ok(self)
    }

    /// Rebuild membership from listing data.
    ///
    /// An object is consumed key by key, the key becoming the member id.
    /// An array is keyed by each record's own `id`, which must be unique.
    /// `null` means empty.
    pub(crate) fn replace(&mut self, data: Value) -> Result<(), CoreError> {
        let mut members = IndexMap::new();
        match data {
            Value::Object(map) => {
                for (id, value) in map {
                    let record = into_record(value, R::KIND, &id)?;
                    let model = Model::new(record, self.options(id.clone(), Record::new()))?;
                    members.insert(id, model);
                }
            }
            Value::Array(items) => {
                for value in items {
                    let record = into_record(value, R::KIND, "<listing item>")?;
                    let id = record_id::<R>(&record)?;
                    if members.contains_key(&id) {
                        return Err(CoreError::InvalidRecord {
                            entity_type: R::KIND,
                            identifier: id,
                            reason: "duplicate id in listing".into(),
                        });
                    }
                    let model = Model::new(record, self.options(id.clone(), Record::new()))?;
                    members.insert(id, model);
                }
            }
            Value::Null => {}
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                return Err(CoreError::InvalidRecord {
                    entity_type: R::KIND,
                    identifier: "<listing>".into(),
                    reason: "expected an object or an array of records".into(),
                });
            }
        }
        self.members = members;
        self.fetched = true;
        Ok(())
    }

    /// Build one model from a record without adopting it.
    pub fn add(&self, record: Record, extra: Record) -> Result<Model<R>, CoreError> {
        let id = record_id::<R>(&record)?;
        Model::new(record, self.options(id, extra))
    }

    /// Member ids in response order.
    pub fn ids(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).collect()
    }

    pub fn get(&self, id: &str) -> Result<&Model<R>, CoreError> {
        self.members.get(id).ok_or_else(|| not_found::<R>(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Model<R>, CoreError> {
        self.members.get_mut(id).ok_or_else(|| not_found::<R>(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    /// Members in response order.
    pub fn all(&self) -> impl Iterator<Item = &Model<R>> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `key_field` → `value_field` across all members, in member order.
    ///
    /// Members without `key_field` are skipped; a missing `value_field`
    /// maps to `null`.
    pub fn listing(&self, key_field: &str, value_field: &str) -> IndexMap<String, Value> {
        Self::collect_listing(self.members.values(), key_field, value_field)
    }

    /// Like [`listing`](Self::listing), restricted to members whose
    /// attributes equal every pair in `predicate`.
    pub fn filtered_member_list(
        &self,
        predicate: &Record,
        key_field: &str,
        value_field: &str,
    ) -> IndexMap<String, Value> {
        let matching = self
            .members
            .values()
            .filter(|m| matches_all(m.attributes(), predicate));
        Self::collect_listing(matching, key_field, value_field)
    }

    /// Every member's summary, keyed by id, in member order.
    pub fn serialize(&self, config: &TerminusConfig) -> IndexMap<String, R::Summary> {
        self.members
            .iter()
            .map(|(id, model)| (id.clone(), model.serialize(config)))
            .collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn options(&self, id: String, extra: Record) -> ModelOptions {
        ModelOptions {
            id,
            scope: self.scope.clone(),
            extra,
        }
    }

    fn collect_listing<'a>(
        members: impl Iterator<Item = &'a Model<R>>,
        key_field: &str,
        value_field: &str,
    ) -> IndexMap<String, Value>
    where
        R: 'a,
    {
        members
            .filter_map(|m| {
                let key = m.attribute(key_field)?;
                let value = m.attribute(value_field).cloned().unwrap_or(Value::Null);
                Some((key_string(key), value))
            })
            .collect()
    }
}

fn not_found<R: Resource>(id: &str) -> CoreError {
    CoreError::NotFound {
        entity_type: R::KIND,
        identifier: id.to_owned(),
    }
}
