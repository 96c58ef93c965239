//! Baseline synthesis.
//!
//! The baseline is the smallest descriptor a fresh, idiomatic project of a
//! given shape would contain: an SDK identifier, one property group with the
//! target moniker, and no explicit items (all default items are covered by
//! implicit globs). It exists purely as a comparison reference for the
//! differ and the strip-defaulted stage; it is never written to disk.
//!
//! Synthesis is deterministic: identical inputs always yield a structurally
//! identical tree, so diff reports are reproducible and idempotence is
//! testable.

use crate::descriptor::{ProjectDescriptor, ProjectGroup, PropertyEntry, PropertyGroup};
use crate::error_codes;
use crate::facts::Facts;
use crate::moniker::{MonikerError, TargetMoniker};
use crate::options::ConversionOptions;
use crate::oracle::{EvaluateError, EvaluationOracle};
use crate::project::{
    BaselineProject, ConfiguredProject, DesktopFramework, ProjectKind, UnconfiguredProject,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const MONIKER_PROPERTY: &str = "TargetFramework";
pub const MONIKER_PROPERTY_PLURAL: &str = "TargetFrameworks";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BaselineError {
    #[error(transparent)]
    UnknownMoniker(#[from] MonikerError),

    #[error("[SDKIFY_BASE_001] baseline evaluation failed for '{moniker}': {source}")]
    Evaluation {
        moniker: String,
        source: EvaluateError,
    },
}

impl BaselineError {
    pub fn code(&self) -> &'static str {
        match self {
            BaselineError::UnknownMoniker(e) => e.code(),
            BaselineError::Evaluation { .. } => error_codes::BASELINE_EVALUATION,
        }
    }
}

/// Flags consumed by [`synthesize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaselineFlags {
    /// Use the web SDK identifier.
    pub is_web_project: bool,
    /// The caller will supply its own moniker property; omit it from the
    /// baseline.
    pub keep_existing_moniker: bool,
}

/// Synthesize the minimal descriptor for a target moniker.
///
/// Fails with [`MonikerError::UnknownPlatformMoniker`] when the moniker
/// cannot be mapped to a known SDK identifier.
pub fn synthesize(
    target: &str,
    flags: BaselineFlags,
    facts: &Facts,
) -> Result<ProjectDescriptor, MonikerError> {
    let moniker = TargetMoniker::parse(target)?;
    let kind = if flags.is_web_project {
        ProjectKind::Web
    } else {
        ProjectKind::Library
    };
    Ok(synthesize_for_kind(&moniker, kind, flags, facts))
}

fn synthesize_for_kind(
    moniker: &TargetMoniker,
    kind: ProjectKind,
    flags: BaselineFlags,
    facts: &Facts,
) -> ProjectDescriptor {
    let era = facts.era(moniker.family());
    let mut group = PropertyGroup::new();
    if !flags.keep_existing_moniker {
        group
            .properties
            .push(PropertyEntry::new(MONIKER_PROPERTY, moniker.raw()));
    }
    if let ProjectKind::WindowsDesktop(framework) = kind {
        group
            .properties
            .push(PropertyEntry::new(desktop_property(framework), "true"));
    }

    ProjectDescriptor {
        sdk: Some(era.sdk_for_kind(kind).to_string()),
        groups: vec![ProjectGroup::Properties(group)],
        legacy_package_refs: Vec::new(),
    }
}

pub fn desktop_property(framework: DesktopFramework) -> &'static str {
    match framework {
        DesktopFramework::Wpf => "UseWPF",
        DesktopFramework::WinForms => "UseWindowsForms",
    }
}

/// Builds a [`BaselineProject`] for a loaded project: detects the project
/// kind from the evaluated original, synthesizes the minimal descriptor,
/// and evaluates it through the oracle.
pub struct BaselineBuilder<'a> {
    facts: &'a Facts,
}

impl<'a> BaselineBuilder<'a> {
    pub fn new(facts: &'a Facts) -> BaselineBuilder<'a> {
        BaselineBuilder { facts }
    }

    pub fn build(
        &self,
        project: &UnconfiguredProject,
        options: &ConversionOptions,
        oracle: &dyn EvaluationOracle,
    ) -> Result<BaselineProject, BaselineError> {
        let target = self.effective_target(project, options)?;
        let kind = self.detect_kind(project, options);
        debug!(project = %project.name, kind = ?kind, target = %target.raw(), "building baseline");

        let flags = BaselineFlags::default();
        let descriptor = Arc::new(synthesize_for_kind(&target, kind, flags, self.facts));

        let mut configured = BTreeMap::new();
        let evaluated = oracle
            .evaluate(&descriptor, &target, project.language, self.facts)
            .map_err(|source| BaselineError::Evaluation {
                moniker: target.raw().to_string(),
                source,
            })?;
        configured.insert(target.raw().to_string(), evaluated);

        Ok(BaselineProject {
            kind,
            language: project.language,
            descriptor,
            configured,
        })
    }

    /// The moniker the baseline is evaluated for: the requested target, or
    /// the project's own explicit moniker when it is being kept.
    fn effective_target(
        &self,
        project: &UnconfiguredProject,
        options: &ConversionOptions,
    ) -> Result<TargetMoniker, MonikerError> {
        if options.keep_existing_moniker {
            if let Some(existing) = explicit_moniker(&project.descriptor) {
                if let Ok(parsed) = TargetMoniker::parse(&existing) {
                    return Ok(parsed);
                }
            }
        }
        options.target()
    }

    fn detect_kind(&self, project: &UnconfiguredProject, options: &ConversionOptions) -> ProjectKind {
        if options.force_web_project {
            return ProjectKind::Web;
        }
        let Some(configured) = project.first_configured() else {
            return ProjectKind::Library;
        };

        if let Some(guids) = configured.property("ProjectTypeGuids") {
            if guids.split(';').any(|g| self.facts.is_web_project_guid(g)) {
                return ProjectKind::Web;
            }
        }

        if let Some(framework) = self.detect_desktop(configured) {
            return ProjectKind::WindowsDesktop(framework);
        }

        match configured.property("OutputType") {
            Some(output) if output.eq_ignore_ascii_case("Exe") => ProjectKind::Executable,
            Some(output) if output.eq_ignore_ascii_case("WinExe") => ProjectKind::Executable,
            _ => ProjectKind::Library,
        }
    }

    fn detect_desktop(&self, configured: &ConfiguredProject) -> Option<DesktopFramework> {
        for (property, framework) in [
            ("UseWPF", DesktopFramework::Wpf),
            ("UseWindowsForms", DesktopFramework::WinForms),
        ] {
            if configured
                .property(property)
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
            {
                return Some(framework);
            }
        }

        // WPF wins over WinForms: WPF projects routinely reference
        // System.Windows.Forms too.
        let mut detected = None;
        for item in configured.items_of_type("Reference") {
            let simple_name = item.include.split(',').next().unwrap_or("");
            match self.facts.desktop_framework_for_reference(simple_name) {
                Some(DesktopFramework::Wpf) => return Some(DesktopFramework::Wpf),
                Some(DesktopFramework::WinForms) => detected = Some(DesktopFramework::WinForms),
                None => {}
            }
        }
        detected
    }
}

/// The project's own explicit, unconditional moniker property value, if
/// one is present and literal.
pub fn explicit_moniker(descriptor: &ProjectDescriptor) -> Option<String> {
    for name in [MONIKER_PROPERTY, MONIKER_PROPERTY_PLURAL] {
        if let Some(entry) = descriptor.find_property(name) {
            let value = entry.value.trim();
            if !value.is_empty() && !value.contains("$(") {
                // Multi-targeting lists evaluate one at a time; the first
                // entry stands in for baseline purposes.
                return Some(value.split(';').next().unwrap_or(value).to_string());
            }
        }
    }
    None
}
