//! Evaluated project state.
//!
//! A [`ConfiguredProject`] holds the evaluation oracle's output (resolved
//! property and item values) for one target moniker. An
//! [`UnconfiguredProject`] owns one configured projected per moniker when
//! multi-targeting; all of them share a single [`ProjectDescriptor`] tree
//! behind an `Arc` rather than duplicating it per moniker.

use crate::descriptor::ProjectDescriptor;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// The shape of project being converted. Closed set; drives SDK identifier
/// selection and desktop property injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Library,
    Executable,
    Web,
    WindowsDesktop(DesktopFramework),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesktopFramework {
    Wpf,
    WinForms,
}

/// Source language of the project, detected from the descriptor file
/// extension. F# has no default compile glob, so explicit compile items are
/// always preserved there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectLanguage {
    CSharp,
    VisualBasic,
    FSharp,
}

impl ProjectLanguage {
    pub fn from_project_path(path: &Path) -> Option<ProjectLanguage> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csproj" => Some(ProjectLanguage::CSharp),
            "vbproj" => Some(ProjectLanguage::VisualBasic),
            "fsproj" => Some(ProjectLanguage::FSharp),
            _ => None,
        }
    }

    pub fn source_extension(&self) -> &'static str {
        match self {
            ProjectLanguage::CSharp => "cs",
            ProjectLanguage::VisualBasic => "vb",
            ProjectLanguage::FSharp => "fs",
        }
    }
}

/// One resolved property value. Evaluated properties retain document order;
/// names are unique (later entries overrode earlier ones in place).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedProperty {
    pub name: String,
    pub value: String,
}

/// One resolved item value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedItem {
    pub item_type: String,
    pub include: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<(String, String)>,
}

impl EvaluatedItem {
    pub fn new(item_type: impl Into<String>, include: impl Into<String>) -> EvaluatedItem {
        EvaluatedItem {
            item_type: item_type.into(),
            include: include.into(),
            metadata: Vec::new(),
        }
    }
}

/// Oracle output for one target moniker, plus a non-owning back-reference
/// to the descriptor it was evaluated from.
#[derive(Debug, Clone)]
pub struct ConfiguredProject {
    pub moniker: String,
    pub descriptor: Arc<ProjectDescriptor>,
    properties: Vec<EvaluatedProperty>,
    index: FxHashMap<String, usize>,
    pub items: Vec<EvaluatedItem>,
}

impl ConfiguredProject {
    pub fn new(
        moniker: impl Into<String>,
        descriptor: Arc<ProjectDescriptor>,
        properties: Vec<EvaluatedProperty>,
        items: Vec<EvaluatedItem>,
    ) -> ConfiguredProject {
        let mut index = FxHashMap::default();
        for (i, p) in properties.iter().enumerate() {
            // Last write wins; producers keep names unique already.
            index.insert(p.name.to_ascii_lowercase(), i);
        }
        ConfiguredProject {
            moniker: moniker.into(),
            descriptor,
            properties,
            index,
            items,
        }
    }

    /// Resolved property value, case-insensitive name lookup.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| self.properties[i].value.as_str())
    }

    pub fn properties(&self) -> &[EvaluatedProperty] {
        &self.properties
    }

    /// All evaluated items of one type (case-insensitive).
    pub fn items_of_type<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a EvaluatedItem> {
        self.items
            .iter()
            .filter(move |i| i.item_type.eq_ignore_ascii_case(item_type))
    }
}

/// The project as loaded: one shared descriptor tree, one configured
/// project per target moniker.
#[derive(Debug, Clone)]
pub struct UnconfiguredProject {
    /// Project identity for error context (typically the file path or name).
    pub name: String,
    pub language: ProjectLanguage,
    pub descriptor: Arc<ProjectDescriptor>,
    pub configured: BTreeMap<String, ConfiguredProject>,
}

impl UnconfiguredProject {
    pub fn first_configured(&self) -> Option<&ConfiguredProject> {
        self.configured.values().next()
    }

    pub fn monikers(&self) -> impl Iterator<Item = &str> {
        self.configured.keys().map(|k| k.as_str())
    }
}

/// A synthesized reference project used purely as a comparison baseline;
/// never written to disk.
#[derive(Debug, Clone)]
pub struct BaselineProject {
    pub kind: ProjectKind,
    pub language: ProjectLanguage,
    pub descriptor: Arc<ProjectDescriptor>,
    pub configured: BTreeMap<String, ConfiguredProject>,
}

impl BaselineProject {
    pub fn first_configured(&self) -> Option<&ConfiguredProject> {
        self.configured.values().next()
    }
}
