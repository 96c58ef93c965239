//! Structural diffing between evaluated project states.
//!
//! This module defines the types used to represent differences between two
//! evaluated projects:
//! - [`ChangeOp`]: a single Add/Remove/Change record for a property or item
//! - [`ChangeReport`]: a versioned, ordered collection of change ops
//!
//! [`diff_projects`] is a pure function over two [`ConfiguredProject`]s; it
//! never mutates its inputs and its output is advisory only — the report
//! never feeds back into conversion.

use crate::project::{ConfiguredProject, EvaluatedItem};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A single change between the left and right evaluated states.
///
/// Marked `#[non_exhaustive]` to allow future additions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
#[non_exhaustive]
pub enum ChangeOp {
    PropertyAdded {
        name: String,
        value: String,
    },
    PropertyRemoved {
        name: String,
        value: String,
    },
    PropertyChanged {
        name: String,
        old_value: String,
        new_value: String,
    },
    ItemAdded {
        item_type: String,
        include: String,
    },
    ItemRemoved {
        item_type: String,
        include: String,
    },
    /// Same item identity on both sides, differing metadata.
    ItemChanged {
        item_type: String,
        include: String,
        /// Metadata keys whose values differ, sorted for reproducibility.
        changed_metadata: Vec<String>,
    },
}

impl ChangeOp {
    pub fn is_item_op(&self) -> bool {
        matches!(
            self,
            ChangeOp::ItemAdded { .. } | ChangeOp::ItemRemoved { .. } | ChangeOp::ItemChanged { .. }
        )
    }
}

/// A versioned, ordered change report.
///
/// Ordering follows the left side's document order, with pure additions
/// from the right side appended in the right side's order, so repeated runs
/// over the same inputs produce identical reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Schema version (currently "1").
    pub version: String,
    /// The ordered list of change operations.
    pub changes: Vec<ChangeOp>,
    /// Whether the comparison is complete. Always `true` today; carried for
    /// schema stability.
    #[serde(default = "default_complete")]
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn default_complete() -> bool {
    true
}

impl ChangeReport {
    pub const SCHEMA_VERSION: &'static str = "1";

    pub fn new(changes: Vec<ChangeOp>) -> ChangeReport {
        ChangeReport {
            version: Self::SCHEMA_VERSION.to_string(),
            changes,
            complete: true,
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn property_ops(&self) -> impl Iterator<Item = &ChangeOp> {
        self.changes.iter().filter(|op| !op.is_item_op())
    }

    pub fn item_ops(&self) -> impl Iterator<Item = &ChangeOp> {
        self.changes.iter().filter(|op| op.is_item_op())
    }
}

/// Compare two evaluated projects.
///
/// Properties are matched by case-insensitive name; items by their
/// `(item_type, include)` identity, metadata excluded. Matched items with
/// differing metadata produce [`ChangeOp::ItemChanged`].
pub fn diff_projects(left: &ConfiguredProject, right: &ConfiguredProject) -> ChangeReport {
    let mut changes = Vec::new();

    for property in left.properties() {
        match right.property(&property.name) {
            None => changes.push(ChangeOp::PropertyRemoved {
                name: property.name.clone(),
                value: property.value.clone(),
            }),
            Some(rv) if rv != property.value => changes.push(ChangeOp::PropertyChanged {
                name: property.name.clone(),
                old_value: property.value.clone(),
                new_value: rv.to_string(),
            }),
            Some(_) => {}
        }
    }
    for property in right.properties() {
        if left.property(&property.name).is_none() {
            changes.push(ChangeOp::PropertyAdded {
                name: property.name.clone(),
                value: property.value.clone(),
            });
        }
    }

    let left_items = index_items(&left.items);
    let right_items = index_items(&right.items);

    for item in &left.items {
        match right_items.get(&item_key(item)) {
            None => changes.push(ChangeOp::ItemRemoved {
                item_type: item.item_type.clone(),
                include: item.include.clone(),
            }),
            Some(other) => {
                let changed = changed_metadata_keys(item, other);
                if !changed.is_empty() {
                    changes.push(ChangeOp::ItemChanged {
                        item_type: item.item_type.clone(),
                        include: item.include.clone(),
                        changed_metadata: changed,
                    });
                }
            }
        }
    }
    for item in &right.items {
        if !left_items.contains_key(&item_key(item)) {
            changes.push(ChangeOp::ItemAdded {
                item_type: item.item_type.clone(),
                include: item.include.clone(),
            });
        }
    }

    ChangeReport::new(changes)
}

fn item_key(item: &EvaluatedItem) -> (String, String) {
    (
        item.item_type.to_ascii_lowercase(),
        item.include.replace('\\', "/").to_ascii_lowercase(),
    )
}

fn index_items(items: &[EvaluatedItem]) -> FxHashMap<(String, String), &EvaluatedItem> {
    let mut index = FxHashMap::default();
    for item in items {
        // First occurrence wins; identities are unique per invariant.
        index.entry(item_key(item)).or_insert(item);
    }
    index
}

fn changed_metadata_keys(left: &EvaluatedItem, right: &EvaluatedItem) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let lookup = |metadata: &[(String, String)], key: &str| {
        metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
    };
    for (key, value) in &left.metadata {
        if lookup(&right.metadata, key).as_deref() != Some(value) {
            keys.push(key.clone());
        }
    }
    for (key, _) in &right.metadata {
        if lookup(&left.metadata, key).is_none() {
            keys.push(key.clone());
        }
    }
    keys.sort();
    keys.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    keys
}
