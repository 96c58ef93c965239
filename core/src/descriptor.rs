//! In-memory representation of a project descriptor.
//!
//! This is the raw, unevaluated document tree: ordered groups of properties
//! and items, each optionally guarded by a condition expression. Conditions
//! are carried as opaque strings; the core only ever performs equality and
//! containment checks on them (see [`crate::condition`] for the one
//! comparison shape it understands).
//!
//! The tree is immutable input to the differ and the converter; the
//! converter always produces a *new* tree so the original stays available
//! for backup by the caller.

use serde::{Deserialize, Serialize};

/// Root of a project descriptor document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Platform-SDK identifier (`Microsoft.NET.Sdk`, ...). `None` for legacy
    /// descriptors; set exactly once per conversion.
    pub sdk: Option<String>,
    /// Ordered property and item groups. Document order is semantically
    /// relevant: later properties override earlier ones during evaluation.
    pub groups: Vec<ProjectGroup>,
    /// External package references recorded in the legacy sidecar format
    /// (`packages.config`), outside the item model. Migrated into inline
    /// `PackageReference` items by the converter.
    pub legacy_package_refs: Vec<LegacyPackageRef>,
}

impl ProjectDescriptor {
    pub fn new() -> ProjectDescriptor {
        ProjectDescriptor::default()
    }

    /// All property entries in document order, with their enclosing group's
    /// condition.
    pub fn properties(&self) -> impl Iterator<Item = (&PropertyEntry, Option<&str>)> {
        self.groups.iter().filter_map(|g| g.as_properties()).flat_map(|g| {
            g.properties
                .iter()
                .map(move |p| (p, g.condition.as_deref()))
        })
    }

    /// All item entries in document order, with their enclosing group's
    /// condition.
    pub fn items(&self) -> impl Iterator<Item = (&ItemEntry, Option<&str>)> {
        self.groups.iter().filter_map(|g| g.as_items()).flat_map(|g| {
            g.items.iter().map(move |i| (i, g.condition.as_deref()))
        })
    }

    /// First unconditional property entry with the given name
    /// (case-insensitive).
    pub fn find_property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties()
            .filter(|(p, group_cond)| group_cond.is_none() && p.condition.is_none())
            .map(|(p, _)| p)
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// A property or item group. The variant set is closed: descriptors contain
/// nothing else the core cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProjectGroup {
    Properties(PropertyGroup),
    Items(ItemGroup),
}

impl ProjectGroup {
    pub fn condition(&self) -> Option<&str> {
        match self {
            ProjectGroup::Properties(g) => g.condition.as_deref(),
            ProjectGroup::Items(g) => g.condition.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ProjectGroup::Properties(g) => g.properties.is_empty(),
            ProjectGroup::Items(g) => g.items.is_empty(),
        }
    }

    pub fn as_properties(&self) -> Option<&PropertyGroup> {
        match self {
            ProjectGroup::Properties(g) => Some(g),
            ProjectGroup::Items(_) => None,
        }
    }

    pub fn as_items(&self) -> Option<&ItemGroup> {
        match self {
            ProjectGroup::Items(g) => Some(g),
            ProjectGroup::Properties(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub properties: Vec<PropertyEntry>,
}

impl PropertyGroup {
    pub fn new() -> PropertyGroup {
        PropertyGroup::default()
    }

    pub fn with_condition(condition: impl Into<String>) -> PropertyGroup {
        PropertyGroup {
            condition: Some(condition.into()),
            properties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub items: Vec<ItemEntry>,
}

impl ItemGroup {
    pub fn new() -> ItemGroup {
        ItemGroup::default()
    }
}

/// A single property: `(name, value, condition)`.
///
/// Names are case-insensitive-unique within an active condition scope;
/// insertion order is preserved and significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl PropertyEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> PropertyEntry {
        PropertyEntry {
            name: name.into(),
            value: value.into(),
            condition: None,
        }
    }
}

/// A single item entry.
///
/// Exactly one of `include`, `update`, or `remove` carries the entry's
/// pattern; `exclude` only ever accompanies `include`. Metadata keys are
/// unique and ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<(String, String)>,
}

impl ItemEntry {
    pub fn include(item_type: impl Into<String>, pattern: impl Into<String>) -> ItemEntry {
        ItemEntry {
            item_type: item_type.into(),
            include: Some(pattern.into()),
            exclude: None,
            update: None,
            remove: None,
            condition: None,
            metadata: Vec::new(),
        }
    }

    pub fn update(item_type: impl Into<String>, pattern: impl Into<String>) -> ItemEntry {
        ItemEntry {
            item_type: item_type.into(),
            include: None,
            exclude: None,
            update: Some(pattern.into()),
            remove: None,
            condition: None,
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> ItemEntry {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// The pattern that identifies this entry: include, update, or remove,
    /// in that precedence order.
    pub fn pattern(&self) -> Option<&str> {
        self.include
            .as_deref()
            .or(self.update.as_deref())
            .or(self.remove.as_deref())
    }

    /// Identity tuple for diffing: two entries are the "same" item when
    /// these match, regardless of metadata. `None` when the entry carries
    /// no pattern at all (malformed).
    pub fn identity(&self) -> Option<ItemIdentity> {
        Some(ItemIdentity {
            item_type: self.item_type.to_ascii_lowercase(),
            pattern: self.pattern()?.replace('\\', "/").to_ascii_lowercase(),
            condition: self.condition.clone(),
        })
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Canonical item identity: case-insensitive type and pattern, plus the raw
/// condition. Unique within a group's active condition scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemIdentity {
    pub item_type: String,
    pub pattern: String,
    pub condition: Option<String>,
}

/// An external package reference in the legacy sidecar format. Version
/// strings are opaque and copied verbatim, never reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPackageRef {
    pub id: String,
    pub version: String,
}

impl LegacyPackageRef {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> LegacyPackageRef {
        LegacyPackageRef {
            id: id.into(),
            version: version.into(),
        }
    }
}
