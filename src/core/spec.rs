// src/core/spec.rs

//! The "spec dict" query protocol used by every `get_*`/`set_*`/`add_*`/`del_*`
//! exposed method, grounded on `Cobalt.Data.Data.match` / `Data.update`'s
//! approach.
//!
//! A [`Spec`] is a bag of `field -> value` pairs sent over the wire. It
//! matches an entity iff, for every pair in the spec, either the value is the
//! wildcard `"*"` or it equals the entity's value for that field. An
//! [`Update`] is the same bag, but merged into the entity's fields instead of
//! compared against them.
//!
//! Entities implement [`Matchable`] once; `Spec::matches`/`Spec::apply_update`
//! stay generic so `get_jobs`, `set_queues`, `get_partitions`, etc. all share
//! one implementation instead of five bespoke ones.

use serde_json::Value;
use std::collections::BTreeMap;

/// A single query/update spec: field name -> JSON value (or the wildcard
/// string `"*"` when used in a query).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Spec(pub BTreeMap<String, Value>);

pub const WILDCARD: &str = "*";

impl Spec {
    pub fn new() -> Self {
        Spec(BTreeMap::new())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    fn is_wildcard(value: &Value) -> bool {
        matches!(value, Value::String(s) if s == WILDCARD)
    }
}

/// Implemented by every entity that can be queried/updated through a [`Spec`].
/// `field(name)` exposes a read-only view of one named field as JSON;
/// `apply_update` merges a spec's fields back into the entity.
pub trait Matchable {
    /// Returns the entity's current value for `field`, or `None` if the
    /// entity has no such field (an unknown field in a spec never matches).
    fn field(&self, field: &str) -> Option<Value>;

    /// Merges every `(field, value)` pair in `update` into the entity.
    /// Unknown fields are ignored (mirrors `Data.update`/`Data.set`, which
    /// only ever writes recognized attributes through typed setters in the
    /// Rust port).
    fn apply_update(&mut self, update: &Spec);

    /// A spec matches iff every field in it is either the wildcard or equal
    /// to the entity's current value for that field.
    fn matches(&self, spec: &Spec) -> bool {
        spec.0.iter().all(|(field, wanted)| {
            if Spec::is_wildcard(wanted) {
                return true;
            }
            self.field(field).as_ref() == Some(wanted)
        })
    }
}

/// Filters `items` against a list of specs (OR semantics across the list,
/// matching `DataSet.Get`/`DataSet.Match`: an item is returned if it matches
/// *any* spec in the list).
pub fn query_all<'a, T: Matchable>(items: impl IntoIterator<Item = &'a T>, specs: &[Spec]) -> Vec<&'a T>
where
    T: 'a,
{
    items
        .into_iter()
        .filter(|item| specs.iter().any(|spec| item.matches(spec)))
        .collect()
}
