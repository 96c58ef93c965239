//! Static, versioned rule data for baseline synthesis and conversion.
//!
//! The tables are immutable once built: obsolete-property denylist, default
//! item globs per item type and language, legacy-to-modern package
//! identifier mappings, implicit framework references, SDK identifiers, and
//! the default property values the SDK implies. Era-specific tables are
//! selected by the target moniker's family.
//!
//! `Facts::builtin()` loads the built-in tables once per process and hands
//! out a shared reference; there is no mutable singleton, and unsynchronized
//! concurrent reads are safe.

use crate::moniker::TargetFamily;
use crate::project::{DesktopFramework, ProjectKind, ProjectLanguage};
use globset::{Glob, GlobMatcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::LazyLock;

const DEFAULT_SDK: &str = "Microsoft.NET.Sdk";
const WEB_SDK: &str = "Microsoft.NET.Sdk.Web";
const WINDOWS_DESKTOP_SDK: &str = "Microsoft.NET.Sdk.WindowsDesktop";

/// Properties that carry no meaning under the SDK and are stripped
/// outright. Lowercase.
const OBSOLETE_PROPERTIES: &[&str] = &[
    "projectguid",
    "projecttypeguids",
    "targetframeworkversion",
    "targetframeworkidentifier",
    "targetframeworkprofile",
    "appdesignerfolder",
    "schemaversion",
    "productversion",
    "fileupgradeflags",
    "upgradebackuplocation",
    "oldtoolsversion",
    "vstoolspath",
    "visualstudioversion",
];

/// Property values the SDK implies when nothing overrides them. Used both
/// to seed baseline evaluation and to strip redundant explicit spellings.
const SDK_DEFAULT_PROPERTIES: &[(&str, &str)] = &[
    ("OutputType", "Library"),
    ("Deterministic", "true"),
    ("FileAlignment", "512"),
    ("ErrorReport", "prompt"),
    ("WarningLevel", "4"),
    ("AutoGenerateBindingRedirects", "false"),
    ("AppendTargetFrameworkToOutputPath", "true"),
    ("GenerateAssemblyInfo", "true"),
];

/// Assemblies referenced implicitly by the SDK; explicit `Reference` items
/// to these are redundant. Lowercase simple names.
const IMPLICIT_REFERENCES: &[&str] = &[
    "mscorlib",
    "system",
    "system.core",
    "system.data",
    "system.data.datasetextensions",
    "system.net.http",
    "system.xml",
    "system.xml.linq",
    "microsoft.csharp",
    "microsoft.visualbasic",
];

/// Desktop assembly references used for project-kind detection.
const WPF_REFERENCES: &[&str] = &["presentationcore", "presentationframework", "windowsbase"];
const WINFORMS_REFERENCES: &[&str] = &["system.windows.forms"];

/// Legacy project-type GUIDs that mark a web project. Lowercase, braced.
const WEB_PROJECT_GUIDS: &[&str] = &[
    "{349c5851-65df-11da-9384-00065b846f21}",
    "{e24c65dc-7377-472b-9aba-bc803b73c61a}",
];

/// The sidecar file name the legacy package-reference format lives in.
pub const PACKAGES_CONFIG_FILE: &str = "packages.config";

/// Era-specific tables, selected by target platform family.
#[derive(Debug)]
pub struct EraFacts {
    family: TargetFamily,
    obsolete_properties: FxHashSet<&'static str>,
    package_renames: FxHashMap<&'static str, &'static str>,
    default_sdk: &'static str,
    web_sdk: &'static str,
    desktop_sdk: &'static str,
}

impl EraFacts {
    pub fn family(&self) -> TargetFamily {
        self.family
    }

    pub fn is_obsolete_property(&self, name: &str) -> bool {
        self.obsolete_properties
            .contains(name.to_ascii_lowercase().as_str())
    }

    /// Modern identifier for a renamed or merged legacy package, if any.
    pub fn package_rename(&self, id: &str) -> Option<&'static str> {
        self.package_renames
            .get(id.to_ascii_lowercase().as_str())
            .copied()
    }

    pub fn sdk_for_kind(&self, kind: ProjectKind) -> &'static str {
        match kind {
            ProjectKind::Library | ProjectKind::Executable => self.default_sdk,
            ProjectKind::Web => self.web_sdk,
            ProjectKind::WindowsDesktop(_) => self.desktop_sdk,
        }
    }
}

/// A default item glob the SDK applies implicitly for one item type.
#[derive(Debug)]
pub struct DefaultGlob {
    pub item_type: &'static str,
    /// `None` when the glob applies regardless of language.
    pub language: Option<ProjectLanguage>,
    pub pattern: &'static str,
    matcher: GlobMatcher,
    /// Matches paths at the glob's root when the pattern starts with `**/`
    /// (the recursive segment also covers zero directories).
    root_matcher: Option<GlobMatcher>,
}

/// How an explicit include pattern relates to a default glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobCoverage {
    /// The include is the glob itself, spelled out.
    Exact,
    /// A concrete path (no wildcards) the glob already covers.
    Covered,
    /// A wildcard pattern other than the glob; subsumption cannot be
    /// decided safely.
    Ambiguous,
    /// Not covered by the glob at all.
    Outside,
}

impl DefaultGlob {
    fn new(
        item_type: &'static str,
        language: Option<ProjectLanguage>,
        pattern: &'static str,
    ) -> DefaultGlob {
        let matcher = Glob::new(pattern)
            .expect("built-in glob patterns are valid")
            .compile_matcher();
        let root_matcher = pattern.strip_prefix("**/").map(|rest| {
            Glob::new(rest)
                .expect("built-in glob patterns are valid")
                .compile_matcher()
        });
        DefaultGlob {
            item_type,
            language,
            pattern,
            matcher,
            root_matcher,
        }
    }

    /// Classify an explicit include pattern against this glob.
    pub fn coverage(&self, include: &str) -> GlobCoverage {
        let normalized = include.trim().replace('\\', "/");
        if normalized.eq_ignore_ascii_case(self.pattern) {
            return GlobCoverage::Exact;
        }
        if normalized.contains(['*', '?']) {
            return GlobCoverage::Ambiguous;
        }
        let covered = self.matcher.is_match(&normalized)
            || self
                .root_matcher
                .as_ref()
                .is_some_and(|m| m.is_match(&normalized));
        if covered {
            GlobCoverage::Covered
        } else {
            GlobCoverage::Outside
        }
    }
}

/// The full, read-only rule set. Loaded once, passed by reference.
#[derive(Debug)]
pub struct Facts {
    eras: Vec<EraFacts>,
    default_globs: Vec<DefaultGlob>,
    default_properties: &'static [(&'static str, &'static str)],
    implicit_references: FxHashSet<&'static str>,
    web_project_guids: FxHashSet<&'static str>,
    wpf_references: FxHashSet<&'static str>,
    winforms_references: FxHashSet<&'static str>,
}

static BUILTIN: LazyLock<Facts> = LazyLock::new(Facts::build_builtin);

impl Facts {
    /// The built-in tables, loaded once per process.
    pub fn builtin() -> &'static Facts {
        &BUILTIN
    }

    fn build_builtin() -> Facts {
        let obsolete: FxHashSet<&'static str> = OBSOLETE_PROPERTIES.iter().copied().collect();

        // Package identifiers renamed or merged in the unified .NET era.
        let net_renames: FxHashMap<&'static str, &'static str> = [
            ("xamarin.forms", "Microsoft.Maui.Controls"),
            ("xamarin.essentials", "Microsoft.Maui.Essentials"),
            ("system.valuetuple", "System.ValueTuple"),
        ]
        .into_iter()
        .collect();

        let eras = vec![
            EraFacts {
                family: TargetFamily::NetFramework,
                obsolete_properties: obsolete.clone(),
                package_renames: FxHashMap::default(),
                default_sdk: DEFAULT_SDK,
                web_sdk: WEB_SDK,
                desktop_sdk: DEFAULT_SDK,
            },
            EraFacts {
                family: TargetFamily::NetCoreApp,
                obsolete_properties: obsolete.clone(),
                package_renames: FxHashMap::default(),
                default_sdk: DEFAULT_SDK,
                web_sdk: WEB_SDK,
                desktop_sdk: WINDOWS_DESKTOP_SDK,
            },
            EraFacts {
                family: TargetFamily::NetStandard,
                obsolete_properties: obsolete.clone(),
                package_renames: FxHashMap::default(),
                default_sdk: DEFAULT_SDK,
                web_sdk: WEB_SDK,
                desktop_sdk: DEFAULT_SDK,
            },
            EraFacts {
                family: TargetFamily::Net,
                obsolete_properties: obsolete,
                package_renames: net_renames,
                default_sdk: DEFAULT_SDK,
                web_sdk: WEB_SDK,
                desktop_sdk: DEFAULT_SDK,
            },
        ];

        let default_globs = vec![
            DefaultGlob::new("Compile", Some(ProjectLanguage::CSharp), "**/*.cs"),
            DefaultGlob::new("Compile", Some(ProjectLanguage::VisualBasic), "**/*.vb"),
            // F# deliberately has no default compile glob: file order is
            // significant, so explicit entries are always preserved.
            DefaultGlob::new("EmbeddedResource", None, "**/*.resx"),
        ];

        Facts {
            eras,
            default_globs,
            default_properties: SDK_DEFAULT_PROPERTIES,
            implicit_references: IMPLICIT_REFERENCES.iter().copied().collect(),
            web_project_guids: WEB_PROJECT_GUIDS.iter().copied().collect(),
            wpf_references: WPF_REFERENCES.iter().copied().collect(),
            winforms_references: WINFORMS_REFERENCES.iter().copied().collect(),
        }
    }

    /// The era tables matching a target family.
    pub fn era(&self, family: TargetFamily) -> &EraFacts {
        self.eras
            .iter()
            .find(|e| e.family == family)
            .expect("every family has era tables")
    }

    /// Default glob for an item type in a given language, if the SDK has
    /// one.
    pub fn default_glob(
        &self,
        item_type: &str,
        language: ProjectLanguage,
    ) -> Option<&DefaultGlob> {
        self.default_globs.iter().find(|g| {
            g.item_type.eq_ignore_ascii_case(item_type)
                && g.language.is_none_or(|l| l == language)
        })
    }

    pub fn default_globs(&self) -> impl Iterator<Item = &DefaultGlob> {
        self.default_globs.iter()
    }

    /// Property defaults implied by the SDK.
    pub fn default_properties(&self) -> &[(&'static str, &'static str)] {
        self.default_properties
    }

    pub fn default_property(&self, name: &str) -> Option<&'static str> {
        self.default_properties
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    /// Whether an assembly simple name is referenced implicitly by the SDK.
    pub fn is_implicit_reference(&self, assembly: &str) -> bool {
        self.implicit_references
            .contains(assembly.trim().to_ascii_lowercase().as_str())
    }

    pub fn is_web_project_guid(&self, guid: &str) -> bool {
        self.web_project_guids
            .contains(guid.trim().to_ascii_lowercase().as_str())
    }

    /// Desktop framework implied by an assembly reference, if any.
    pub fn desktop_framework_for_reference(&self, assembly: &str) -> Option<DesktopFramework> {
        let name = assembly.trim().to_ascii_lowercase();
        if self.wpf_references.contains(name.as_str()) {
            Some(DesktopFramework::Wpf)
        } else if self.winforms_references.contains(name.as_str()) {
            Some(DesktopFramework::WinForms)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obsolete_properties_are_case_insensitive() {
        let era = Facts::builtin().era(TargetFamily::Net);
        assert!(era.is_obsolete_property("TargetFrameworkVersion"));
        assert!(era.is_obsolete_property("PROJECTGUID"));
        assert!(!era.is_obsolete_property("OutputType"));
    }

    #[test]
    fn compile_glob_coverage() {
        let facts = Facts::builtin();
        let glob = facts
            .default_glob("Compile", ProjectLanguage::CSharp)
            .unwrap();
        assert_eq!(glob.coverage("**/*.cs"), GlobCoverage::Exact);
        assert_eq!(glob.coverage("**\\*.cs"), GlobCoverage::Exact);
        assert_eq!(glob.coverage("Program.cs"), GlobCoverage::Covered);
        assert_eq!(glob.coverage("Sub\\Dir\\File.cs"), GlobCoverage::Covered);
        assert_eq!(glob.coverage("Views/*.cs"), GlobCoverage::Ambiguous);
        assert_eq!(glob.coverage("readme.txt"), GlobCoverage::Outside);
    }

    #[test]
    fn fsharp_has_no_compile_glob() {
        assert!(Facts::builtin()
            .default_glob("Compile", ProjectLanguage::FSharp)
            .is_none());
    }

    #[test]
    fn desktop_sdk_depends_on_era() {
        let facts = Facts::builtin();
        let desktop = ProjectKind::WindowsDesktop(DesktopFramework::Wpf);
        assert_eq!(
            facts.era(TargetFamily::NetCoreApp).sdk_for_kind(desktop),
            "Microsoft.NET.Sdk.WindowsDesktop"
        );
        assert_eq!(
            facts.era(TargetFamily::Net).sdk_for_kind(desktop),
            "Microsoft.NET.Sdk"
        );
        assert_eq!(
            facts.era(TargetFamily::Net).sdk_for_kind(ProjectKind::Web),
            "Microsoft.NET.Sdk.Web"
        );
    }

    #[test]
    fn package_renames_only_exist_in_modern_eras() {
        let facts = Facts::builtin();
        assert_eq!(
            facts.era(TargetFamily::Net).package_rename("Xamarin.Forms"),
            Some("Microsoft.Maui.Controls")
        );
        assert_eq!(
            facts
                .era(TargetFamily::NetCoreApp)
                .package_rename("Xamarin.Forms"),
            None
        );
    }

    #[test]
    fn implicit_references() {
        let facts = Facts::builtin();
        assert!(facts.is_implicit_reference("System.Core"));
        assert!(facts.is_implicit_reference(" system "));
        assert!(!facts.is_implicit_reference("Newtonsoft.Json"));
    }
}
