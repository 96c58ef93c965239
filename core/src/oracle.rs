//! Evaluation oracle boundary.
//!
//! Resolving a descriptor's effective property and item values for a
//! moniker is the host build toolchain's job, injected behind
//! [`EvaluationOracle`]. The bundled [`BuiltinOracle`] is a deliberately
//! minimal stand-in, not an evaluator: ordered property assignment with
//! case-insensitive override, `$(Prop)` expansion, and the single-comparison
//! condition shape. Entries guarded by anything richer are skipped.

use crate::condition;
use crate::descriptor::{ItemGroup, ProjectDescriptor, ProjectGroup, PropertyGroup};
use crate::error_codes;
use crate::facts::Facts;
use crate::moniker::TargetMoniker;
use crate::project::{ConfiguredProject, EvaluatedItem, EvaluatedProperty, ProjectLanguage};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvaluateError {
    #[error("[SDKIFY_EVAL_001] evaluation failed for moniker '{moniker}': {message}. Suggestion: report a bug with the project file if possible.")]
    Internal { moniker: String, message: String },
}

impl EvaluateError {
    pub fn code(&self) -> &'static str {
        match self {
            EvaluateError::Internal { .. } => error_codes::EVAL_INTERNAL,
        }
    }
}

/// Capability to evaluate a descriptor tree for one target moniker.
///
/// The conversion pipeline only ever consumes the oracle's *output*; it
/// never re-implements evaluation itself.
pub trait EvaluationOracle {
    fn evaluate(
        &self,
        descriptor: &Arc<ProjectDescriptor>,
        moniker: &TargetMoniker,
        language: ProjectLanguage,
        facts: &Facts,
    ) -> Result<ConfiguredProject, EvaluateError>;
}

/// The bundled minimal oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinOracle;

impl BuiltinOracle {
    pub fn new() -> BuiltinOracle {
        BuiltinOracle
    }
}

impl EvaluationOracle for BuiltinOracle {
    fn evaluate(
        &self,
        descriptor: &Arc<ProjectDescriptor>,
        moniker: &TargetMoniker,
        language: ProjectLanguage,
        facts: &Facts,
    ) -> Result<ConfiguredProject, EvaluateError> {
        let mut env = PropertyEnv::new();

        // The moniker under evaluation behaves like a property, so
        // conditions over it resolve.
        env.set("TargetFramework", moniker.raw());

        // An SDK-style descriptor starts from the toolchain's implicit
        // property defaults.
        if descriptor.sdk.is_some() {
            for &(name, value) in facts.default_properties() {
                env.set(name, value);
            }
        }

        // Properties first, in document order; items see the final values.
        for group in &descriptor.groups {
            if let ProjectGroup::Properties(g) = group {
                evaluate_property_group(g, &mut env);
            }
        }

        let mut items: Vec<EvaluatedItem> = Vec::new();

        if descriptor.sdk.is_some() && default_items_enabled(&env) {
            for glob in facts.default_globs() {
                if glob.language.is_none_or(|l| l == language) {
                    items.push(EvaluatedItem::new(glob.item_type, glob.pattern));
                }
            }
        }

        for group in &descriptor.groups {
            if let ProjectGroup::Items(g) = group {
                evaluate_item_group(g, &env, &mut items);
            }
        }

        Ok(ConfiguredProject::new(
            moniker.raw(),
            Arc::clone(descriptor),
            env.into_properties(),
            items,
        ))
    }
}

fn evaluate_property_group(group: &PropertyGroup, env: &mut PropertyEnv) {
    // Unsupported condition shapes skip the guarded scope entirely.
    if !env.condition_holds(group.condition.as_deref()) {
        return;
    }
    for property in &group.properties {
        if !env.condition_holds(property.condition.as_deref()) {
            continue;
        }
        let value = env.expand(&property.value);
        env.set(&property.name, &value);
    }
}

fn evaluate_item_group(group: &ItemGroup, env: &PropertyEnv, items: &mut Vec<EvaluatedItem>) {
    if !env.condition_holds(group.condition.as_deref()) {
        return;
    }
    for item in &group.items {
        if !env.condition_holds(item.condition.as_deref()) {
            continue;
        }
        let metadata: Vec<(String, String)> = item
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), env.expand(v)))
            .collect();

        if let Some(include) = &item.include {
            items.push(EvaluatedItem {
                item_type: item.item_type.clone(),
                include: env.expand(include),
                metadata,
            });
        } else if let Some(update) = &item.update {
            // Update merges metadata into already-evaluated matches.
            let pattern = env.expand(update);
            for existing in items
                .iter_mut()
                .filter(|i| i.item_type.eq_ignore_ascii_case(&item.item_type))
                .filter(|i| i.include.eq_ignore_ascii_case(&pattern))
            {
                merge_metadata(&mut existing.metadata, &metadata);
            }
        } else if let Some(remove) = &item.remove {
            let pattern = env.expand(remove);
            items.retain(|i| {
                !(i.item_type.eq_ignore_ascii_case(&item.item_type)
                    && i.include.eq_ignore_ascii_case(&pattern))
            });
        }
    }
}

fn merge_metadata(target: &mut Vec<(String, String)>, updates: &[(String, String)]) {
    for (key, value) in updates {
        match target.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, v)) => *v = value.clone(),
            None => target.push((key.clone(), value.clone())),
        }
    }
}

fn default_items_enabled(env: &PropertyEnv) -> bool {
    for switch in ["EnableDefaultItems", "EnableDefaultCompileItems"] {
        if let Some(value) = env.get(switch) {
            if value.eq_ignore_ascii_case("false") {
                return false;
            }
        }
    }
    true
}

/// Ordered property set with case-insensitive override semantics.
struct PropertyEnv {
    properties: Vec<EvaluatedProperty>,
    index: FxHashMap<String, usize>,
}

impl PropertyEnv {
    fn new() -> PropertyEnv {
        PropertyEnv {
            properties: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    fn set(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(&i) => self.properties[i].value = value.to_string(),
            None => {
                self.index.insert(key, self.properties.len());
                self.properties.push(EvaluatedProperty {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| self.properties[i].value.as_str())
    }

    fn condition_holds(&self, cond: Option<&str>) -> bool {
        match cond {
            None => true,
            Some(cond) => {
                condition::evaluate(cond, &|name| self.get(name).map(str::to_string))
                    .unwrap_or(false)
            }
        }
    }

    /// Single-pass `$(Prop)` expansion. Stored values were themselves
    /// expanded when set, so chains resolve without recursion.
    fn expand(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("$(") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find(')') {
                Some(end) => {
                    let name = &after[..end];
                    if let Some(v) = self.get(name) {
                        out.push_str(v);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn into_properties(self) -> Vec<EvaluatedProperty> {
        self.properties
    }
}
