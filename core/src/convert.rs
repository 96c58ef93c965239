//! The conversion pipeline.
//!
//! [`Converter::convert`] runs a fixed sequence of rewrite stages over the
//! original descriptor tree, each stage consuming the previous stage's
//! output and producing a new tree — the original is never mutated:
//!
//! 1. strip-obsolete: drop denylisted properties
//! 2. strip-defaulted: drop properties the SDK already implies
//! 3. retarget: replace/insert the target moniker property
//! 4. default-item consolidation: drop items covered by implicit globs
//! 5. package-reference migration: legacy sidecar refs become inline items
//! 6. condition simplification: resolve moniker tautologies
//! 7. group normalization: merge neighbors, drop empties
//!
//! Running the pipeline on its own output is a no-op; that idempotence is a
//! correctness property, not an optimization. Hard errors only arise from
//! structurally invalid input; cosmetic-rule failures degrade to preserving
//! the original entry and recording a warning.

use crate::baseline::{
    desktop_property, explicit_moniker, BaselineBuilder, BaselineError, MONIKER_PROPERTY,
    MONIKER_PROPERTY_PLURAL,
};
use crate::condition;
use crate::descriptor::{
    ItemEntry, ItemGroup, LegacyPackageRef, ProjectDescriptor, ProjectGroup, PropertyEntry,
    PropertyGroup,
};
use crate::error_codes;
use crate::facts::{Facts, GlobCoverage, PACKAGES_CONFIG_FILE};
use crate::moniker::{MonikerError, TargetMoniker};
use crate::options::ConversionOptions;
use crate::oracle::{EvaluateError, EvaluationOracle};
use crate::project::{BaselineProject, ProjectKind, UnconfiguredProject};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const STAGE_VALIDATE: &str = "validate";
const STAGE_STRIP_OBSOLETE: &str = "strip-obsolete";
const STAGE_STRIP_DEFAULTED: &str = "strip-defaulted";
const STAGE_RETARGET: &str = "retarget";
const STAGE_CONSOLIDATE_ITEMS: &str = "default-item-consolidation";
const STAGE_MIGRATE_PACKAGES: &str = "package-reference-migration";
const STAGE_SIMPLIFY_CONDITIONS: &str = "condition-simplification";
const STAGE_NORMALIZE_GROUPS: &str = "group-normalization";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error("[SDKIFY_CONV_001] malformed descriptor in project '{project}' at stage '{stage}': {message}. Suggestion: fix the project file and retry.")]
    MalformedDescriptor {
        project: String,
        stage: &'static str,
        message: String,
    },

    /// Subsumption by a default glob could not be decided safely. Never
    /// surfaced as a hard error: the converter degrades to preserving the
    /// entry and records this as a warning.
    #[error("[SDKIFY_CONV_002] ambiguous default-item coverage for {item_type} '{pattern}'; entry preserved")]
    AmbiguousDefaultItem { item_type: String, pattern: String },

    #[error(transparent)]
    UnknownMoniker(#[from] MonikerError),

    #[error(transparent)]
    Baseline(#[from] BaselineError),

    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::MalformedDescriptor { .. } => error_codes::CONVERT_MALFORMED,
            ConvertError::AmbiguousDefaultItem { .. } => error_codes::CONVERT_AMBIGUOUS_ITEM,
            ConvertError::UnknownMoniker(e) => e.code(),
            ConvertError::Baseline(e) => e.code(),
            ConvertError::Evaluate(e) => e.code(),
        }
    }
}

/// Summary metadata about one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSummary {
    /// Whether every rewrite rule applied cleanly. `false` when any rule
    /// degraded to preservation.
    pub complete: bool,
    /// Human-readable explanations for preserved entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Names of the stages that ran, in order.
    pub stages: Vec<String>,
}

impl ConvertSummary {
    fn new() -> ConvertSummary {
        ConvertSummary {
            complete: true,
            warnings: Vec::new(),
            stages: Vec::new(),
        }
    }

    fn enter(&mut self, stage: &'static str) {
        debug!(stage, "conversion stage");
        self.stages.push(stage.to_string());
    }

    fn warn(&mut self, warning: String) {
        self.warnings.push(warning);
        self.complete = false;
    }
}

/// A fully transformed descriptor plus its conversion summary. Either the
/// whole tree is produced or none is; there is no partial output.
#[derive(Debug, Clone)]
pub struct ConvertedProject {
    pub descriptor: ProjectDescriptor,
    pub summary: ConvertSummary,
}

/// The multi-stage rewrite pipeline.
pub struct Converter<'a> {
    project: &'a UnconfiguredProject,
    baseline: &'a BaselineProject,
    facts: &'a Facts,
}

impl<'a> Converter<'a> {
    pub fn new(
        project: &'a UnconfiguredProject,
        baseline: &'a BaselineProject,
        facts: &'a Facts,
    ) -> Converter<'a> {
        Converter {
            project,
            baseline,
            facts,
        }
    }

    pub fn convert(&self, options: &ConversionOptions) -> Result<ConvertedProject, ConvertError> {
        let target = options.target()?;
        self.ensure_well_formed()?;

        let mut summary = ConvertSummary::new();
        let mut tree = (*self.project.descriptor).clone();

        summary.enter(STAGE_STRIP_OBSOLETE);
        tree = self.strip_obsolete(tree, &target, &mut summary);

        summary.enter(STAGE_STRIP_DEFAULTED);
        tree = self.strip_defaulted(tree);

        summary.enter(STAGE_RETARGET);
        tree = self.retarget(tree, &target, options);

        summary.enter(STAGE_CONSOLIDATE_ITEMS);
        tree = self.consolidate_default_items(tree, &mut summary);

        summary.enter(STAGE_MIGRATE_PACKAGES);
        tree = self.migrate_package_references(tree, &target);

        summary.enter(STAGE_SIMPLIFY_CONDITIONS);
        tree = self.simplify_conditions(tree, options);

        summary.enter(STAGE_NORMALIZE_GROUPS);
        tree = normalize_groups(tree);

        Ok(ConvertedProject {
            descriptor: tree,
            summary,
        })
    }

    /// Structural validation. The only source of hard conversion errors.
    fn ensure_well_formed(&self) -> Result<(), ConvertError> {
        let malformed = |message: String| ConvertError::MalformedDescriptor {
            project: self.project.name.clone(),
            stage: STAGE_VALIDATE,
            message,
        };
        for (item, _) in self.project.descriptor.items() {
            if item.item_type.trim().is_empty() {
                return Err(malformed("item entry with no item type".to_string()));
            }
            if item.pattern().is_none() {
                return Err(malformed(format!(
                    "item entry '{}' has no include, update, or remove pattern",
                    item.item_type
                )));
            }
        }
        for (property, _) in self.project.descriptor.properties() {
            if property.name.trim().is_empty() {
                return Err(malformed("property entry with no name".to_string()));
            }
        }
        Ok(())
    }

    /// Stage 1: remove properties on the denylist for the target family.
    ///
    /// A denylisted property that some still-present condition references
    /// is left intact and flagged; condition rewriting is out of scope.
    fn strip_obsolete(
        &self,
        mut tree: ProjectDescriptor,
        target: &TargetMoniker,
        summary: &mut ConvertSummary,
    ) -> ProjectDescriptor {
        let era = self.facts.era(target.family());

        // Conditions that survive this stage: group conditions, item
        // conditions, and conditions on properties that are not themselves
        // being stripped.
        let mut conditions: Vec<String> = Vec::new();
        for group in &tree.groups {
            conditions.extend(group.condition().map(str::to_string));
            match group {
                ProjectGroup::Properties(g) => conditions.extend(
                    g.properties
                        .iter()
                        .filter(|p| !era.is_obsolete_property(&p.name))
                        .filter_map(|p| p.condition.clone()),
                ),
                ProjectGroup::Items(g) => {
                    conditions.extend(g.items.iter().filter_map(|i| i.condition.clone()))
                }
            }
        }

        for group in &mut tree.groups {
            let ProjectGroup::Properties(g) = group else {
                continue;
            };
            g.properties.retain(|p| {
                if !era.is_obsolete_property(&p.name) {
                    return true;
                }
                let referenced = conditions
                    .iter()
                    .any(|c| condition::references_property(c, &p.name));
                if referenced {
                    summary.warn(format!(
                        "obsolete property '{}' is referenced by a condition and was left in place",
                        p.name
                    ));
                }
                referenced
            });
        }
        tree
    }

    /// Stage 2: drop unconditional properties whose evaluated value equals
    /// the baseline's evaluated value for every configured moniker — the
    /// SDK already implies them.
    fn strip_defaulted(&self, mut tree: ProjectDescriptor) -> ProjectDescriptor {
        let is_defaulted = |property: &PropertyEntry| {
            if is_moniker_property(&property.name) {
                return false;
            }
            // Values still carrying property references are not literal
            // enough to compare safely.
            if property.value.contains("$(") {
                return false;
            }
            let mut any = false;
            for configured in self.baseline.configured.values() {
                match configured.property(&property.name) {
                    Some(baseline_value)
                        if baseline_value
                            .trim()
                            .eq_ignore_ascii_case(property.value.trim()) =>
                    {
                        any = true
                    }
                    _ => return false,
                }
            }
            any
        };

        for group in &mut tree.groups {
            let ProjectGroup::Properties(g) = group else {
                continue;
            };
            if g.condition.is_some() {
                continue;
            }
            g.properties
                .retain(|p| p.condition.is_some() || !is_defaulted(p));
        }
        tree
    }

    /// Stage 3: set the platform-SDK identifier and the moniker property.
    fn retarget(
        &self,
        mut tree: ProjectDescriptor,
        target: &TargetMoniker,
        options: &ConversionOptions,
    ) -> ProjectDescriptor {
        // The root SDK identifier is set exactly once per conversion, from
        // the baseline's resolved project kind.
        tree.sdk = self.baseline.descriptor.sdk.clone();

        let keep_existing =
            options.keep_existing_moniker && explicit_moniker(&self.project.descriptor).is_some();

        if !keep_existing {
            let mut replaced = false;
            for group in &mut tree.groups {
                let ProjectGroup::Properties(g) = group else {
                    continue;
                };
                // Moniker spellings inside conditional scopes are left
                // alone here; stage 5 decides whether their guard holds.
                if g.condition.is_some() {
                    continue;
                }
                g.properties.retain_mut(|p| {
                    if p.condition.is_some() || !is_moniker_property(&p.name) {
                        return true;
                    }
                    if replaced {
                        // Duplicate moniker spellings collapse into one.
                        return false;
                    }
                    replaced = true;
                    p.name = MONIKER_PROPERTY.to_string();
                    p.value = target.raw().to_string();
                    p.condition = None;
                    true
                });
            }
            if !replaced {
                insert_leading_property(
                    &mut tree,
                    PropertyEntry::new(MONIKER_PROPERTY, target.raw()),
                );
            }
        }

        // Desktop projects additionally opt in to their UI framework.
        if let ProjectKind::WindowsDesktop(framework) = self.baseline.kind {
            let name = desktop_property(framework);
            let already_present = tree
                .properties()
                .any(|(p, _)| p.name.eq_ignore_ascii_case(name));
            if !already_present {
                append_property(&mut tree, PropertyEntry::new(name, "true"));
            }
        }
        tree
    }

    /// Stage 4: drop explicit items the target family's default globs
    /// already cover; keep carve-outs with metadata as `Update` overrides.
    /// Undecidable coverage degrades to preservation, never to an error.
    fn consolidate_default_items(
        &self,
        mut tree: ProjectDescriptor,
        summary: &mut ConvertSummary,
    ) -> ProjectDescriptor {
        let language = self.project.language;

        for group in &mut tree.groups {
            let ProjectGroup::Items(g) = group else {
                continue;
            };
            // An entire group guarded by a condition is preserved verbatim;
            // the implicit globs apply unconditionally, so folding its
            // entries in would widen their scope.
            if g.condition.is_some() {
                continue;
            }
            let mut rewritten: Vec<ItemEntry> = Vec::with_capacity(g.items.len());
            for item in g.items.drain(..) {
                // Explicit references to implicitly-referenced framework
                // assemblies are redundant under the SDK.
                if item.item_type.eq_ignore_ascii_case("Reference") {
                    let simple_name = item
                        .include
                        .as_deref()
                        .and_then(|i| i.split(',').next())
                        .unwrap_or("");
                    if self.facts.is_implicit_reference(simple_name) {
                        continue;
                    }
                    rewritten.push(item);
                    continue;
                }

                // The legacy package sidecar itself disappears with the
                // inline migration.
                if matches!(
                    item.item_type.to_ascii_lowercase().as_str(),
                    "none" | "content"
                ) && item
                    .include
                    .as_deref()
                    .is_some_and(|i| i.eq_ignore_ascii_case(PACKAGES_CONFIG_FILE))
                {
                    continue;
                }

                // Update/Remove entries are already in override form.
                if item.include.is_none() {
                    rewritten.push(item);
                    continue;
                }

                let Some(glob) = self.facts.default_glob(&item.item_type, language) else {
                    rewritten.push(item);
                    continue;
                };

                // Entries guarded by a condition are preserved verbatim;
                // the implicit glob applies unconditionally, so folding
                // them in would widen their scope.
                if item.condition.is_some() {
                    rewritten.push(item);
                    continue;
                }

                let include = item.include.as_deref().unwrap_or("");
                if item.exclude.is_some() {
                    summary.warn(
                        ConvertError::AmbiguousDefaultItem {
                            item_type: item.item_type.clone(),
                            pattern: include.to_string(),
                        }
                        .to_string(),
                    );
                    rewritten.push(item);
                    continue;
                }

                match glob.coverage(include) {
                    GlobCoverage::Exact | GlobCoverage::Covered => {
                        if item.metadata.is_empty() {
                            // Fully subsumed by the implicit glob.
                            continue;
                        }
                        // A covered carve-out with metadata becomes an
                        // Update override; no explicit Remove counter-entry
                        // is needed.
                        let mut entry = item;
                        entry.update = entry.include.take();
                        rewritten.push(entry);
                    }
                    GlobCoverage::Ambiguous => {
                        summary.warn(
                            ConvertError::AmbiguousDefaultItem {
                                item_type: item.item_type.clone(),
                                pattern: include.to_string(),
                            }
                            .to_string(),
                        );
                        rewritten.push(item);
                    }
                    GlobCoverage::Outside => rewritten.push(item),
                }
            }
            g.items = rewritten;
        }
        tree
    }

    /// Stage 5: translate legacy sidecar package references into inline
    /// `PackageReference` items, remapping renamed identifiers. Version
    /// strings are copied verbatim.
    fn migrate_package_references(
        &self,
        mut tree: ProjectDescriptor,
        target: &TargetMoniker,
    ) -> ProjectDescriptor {
        if tree.legacy_package_refs.is_empty() {
            return tree;
        }
        let era = self.facts.era(target.family());
        let refs: Vec<LegacyPackageRef> = std::mem::take(&mut tree.legacy_package_refs);

        // Assembly references satisfied by a migrated package are dropped.
        let migrated_ids: FxHashSet<String> = refs
            .iter()
            .map(|r| r.id.to_ascii_lowercase())
            .collect();
        for group in &mut tree.groups {
            let ProjectGroup::Items(g) = group else {
                continue;
            };
            g.items.retain(|item| {
                if !item.item_type.eq_ignore_ascii_case("Reference") {
                    return true;
                }
                let simple_name = item
                    .include
                    .as_deref()
                    .and_then(|i| i.split(',').next())
                    .map(|n| n.trim().to_ascii_lowercase())
                    .unwrap_or_default();
                !migrated_ids.contains(&simple_name)
            });
        }

        let mut group = ItemGroup::new();
        for package in refs {
            let id = era
                .package_rename(&package.id)
                .unwrap_or(package.id.as_str())
                .to_string();
            group.items.push(
                ItemEntry::include("PackageReference", id)
                    .with_metadata("Version", package.version),
            );
        }
        tree.groups.push(ProjectGroup::Items(group));
        tree
    }

    /// Stage 6: resolve conditions made tautological by the retarget: a
    /// single comparison of the moniker property against a literal. True
    /// conditions are removed, false branches dropped; anything else is
    /// untouched.
    fn simplify_conditions(
        &self,
        mut tree: ProjectDescriptor,
        options: &ConversionOptions,
    ) -> ProjectDescriptor {
        // Post-retarget the moniker has exactly one value.
        let moniker_value = tree
            .find_property(MONIKER_PROPERTY)
            .or_else(|| tree.find_property(MONIKER_PROPERTY_PLURAL))
            .map(|p| p.value.clone())
            .unwrap_or_else(|| options.target_moniker.clone());

        let resolve = |cond: &Option<String>| -> Option<bool> {
            let cmp = condition::parse_comparison(cond.as_deref()?)?;
            if !is_moniker_property(&cmp.property) {
                return None;
            }
            // Multi-target lists keep their conditions meaningful.
            if moniker_value.contains(';') {
                return None;
            }
            let equal = moniker_value.trim().eq_ignore_ascii_case(cmp.literal.trim());
            Some(match cmp.op {
                condition::Comparison::Equal => equal,
                condition::Comparison::NotEqual => !equal,
            })
        };

        tree.groups.retain_mut(|group| {
            match resolve(&match group {
                ProjectGroup::Properties(g) => g.condition.clone(),
                ProjectGroup::Items(g) => g.condition.clone(),
            }) {
                Some(false) => return false,
                Some(true) => match group {
                    ProjectGroup::Properties(g) => g.condition = None,
                    ProjectGroup::Items(g) => g.condition = None,
                },
                None => {}
            }
            match group {
                ProjectGroup::Properties(g) => {
                    g.properties.retain_mut(|p| match resolve(&p.condition) {
                        Some(false) => false,
                        Some(true) => {
                            p.condition = None;
                            true
                        }
                        None => true,
                    });
                }
                ProjectGroup::Items(g) => {
                    g.items.retain_mut(|i| match resolve(&i.condition) {
                        Some(false) => false,
                        Some(true) => {
                            i.condition = None;
                            true
                        }
                        None => true,
                    });
                }
            }
            true
        });
        tree
    }
}

/// Stage 7: merge adjacent same-kind groups with identical conditions and
/// drop groups emptied by earlier stages. Relative entry order is
/// preserved.
fn normalize_groups(mut tree: ProjectDescriptor) -> ProjectDescriptor {
    let mut merged: Vec<ProjectGroup> = Vec::with_capacity(tree.groups.len());
    for group in tree.groups.drain(..) {
        if group.is_empty() {
            continue;
        }
        match (merged.last_mut(), group) {
            (Some(ProjectGroup::Properties(last)), ProjectGroup::Properties(mut next))
                if last.condition == next.condition =>
            {
                last.properties.append(&mut next.properties);
            }
            (Some(ProjectGroup::Items(last)), ProjectGroup::Items(mut next))
                if last.condition == next.condition =>
            {
                last.items.append(&mut next.items);
            }
            (_, group) => merged.push(group),
        }
    }
    tree.groups = merged;
    tree
}

fn is_moniker_property(name: &str) -> bool {
    name.eq_ignore_ascii_case(MONIKER_PROPERTY) || name.eq_ignore_ascii_case(MONIKER_PROPERTY_PLURAL)
}

fn insert_leading_property(tree: &mut ProjectDescriptor, property: PropertyEntry) {
    for group in &mut tree.groups {
        if let ProjectGroup::Properties(g) = group {
            if g.condition.is_none() {
                g.properties.insert(0, property);
                return;
            }
        }
    }
    let mut group = PropertyGroup::new();
    group.properties.push(property);
    tree.groups.insert(0, ProjectGroup::Properties(group));
}

fn append_property(tree: &mut ProjectDescriptor, property: PropertyEntry) {
    for group in &mut tree.groups {
        if let ProjectGroup::Properties(g) = group {
            if g.condition.is_none() {
                g.properties.push(property);
                return;
            }
        }
    }
    let mut group = PropertyGroup::new();
    group.properties.push(property);
    tree.groups.insert(0, ProjectGroup::Properties(group));
}

/// Full single-project pipeline: evaluate the original, build the SDK
/// baseline, convert. This is what batch conversion and the CLI call.
pub fn convert_project(
    name: &str,
    language: crate::project::ProjectLanguage,
    descriptor: Arc<ProjectDescriptor>,
    options: &ConversionOptions,
    facts: &Facts,
    oracle: &dyn EvaluationOracle,
) -> Result<ConvertedProject, ConvertError> {
    let project = evaluate_project(name, language, descriptor, options, facts, oracle)?;
    let baseline = BaselineBuilder::new(facts).build(&project, options, oracle)?;
    Converter::new(&project, &baseline, facts).convert(options)
}

/// Evaluate the original descriptor for each of its source monikers.
pub fn evaluate_project(
    name: &str,
    language: crate::project::ProjectLanguage,
    descriptor: Arc<ProjectDescriptor>,
    options: &ConversionOptions,
    facts: &Facts,
    oracle: &dyn EvaluationOracle,
) -> Result<UnconfiguredProject, ConvertError> {
    let target = options.target()?;
    let monikers = source_monikers(&descriptor, &target);

    let mut configured = BTreeMap::new();
    for moniker in monikers {
        let evaluated = oracle.evaluate(&descriptor, &moniker, language, facts)?;
        configured.insert(moniker.raw().to_string(), evaluated);
    }

    Ok(UnconfiguredProject {
        name: name.to_string(),
        language,
        descriptor,
        configured,
    })
}

/// The monikers the original project targets: explicit `TargetFrameworks`
/// entries, an explicit `TargetFramework`, or the legacy
/// `TargetFrameworkVersion`, falling back to the conversion target.
fn source_monikers(descriptor: &ProjectDescriptor, target: &TargetMoniker) -> Vec<TargetMoniker> {
    let mut monikers: Vec<TargetMoniker> = Vec::new();

    if let Some(entry) = descriptor.find_property(MONIKER_PROPERTY_PLURAL) {
        monikers.extend(
            entry
                .value
                .split(';')
                .filter_map(|m| TargetMoniker::parse(m).ok()),
        );
    }
    if monikers.is_empty() {
        if let Some(entry) = descriptor.find_property(MONIKER_PROPERTY) {
            monikers.extend(TargetMoniker::parse(&entry.value).ok());
        }
    }
    if monikers.is_empty() {
        if let Some(entry) = descriptor.find_property("TargetFrameworkVersion") {
            monikers.extend(TargetMoniker::from_legacy_version(&entry.value));
        }
    }
    if monikers.is_empty() {
        monikers.push(target.clone());
    }
    monikers
}
