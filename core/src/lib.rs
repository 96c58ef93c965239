//! sdkify: convert legacy build-project descriptors to SDK-style.
//!
//! This crate provides functionality for:
//! - Modeling project descriptors (property/item groups with conditions)
//! - Synthesizing the minimal SDK baseline for a target framework moniker
//! - Diffing two evaluated project states into an ordered change report
//! - Running the multi-stage rewrite pipeline that produces the smallest
//!   descriptor preserving the original build behavior
//! - Serializing change reports and converted descriptors
//!
//! # Quick Start
//!
//! ```ignore
//! use sdkify::{BuiltinOracle, ConversionOptions, Facts};
//! use std::sync::Arc;
//!
//! let descriptor = Arc::new(sdkify::parse_descriptor(&xml)?);
//! let options = ConversionOptions::with_target("net5.0");
//! let converted = sdkify::convert_project(
//!     "app.csproj",
//!     sdkify::ProjectLanguage::CSharp,
//!     descriptor,
//!     &options,
//!     Facts::builtin(),
//!     &BuiltinOracle::new(),
//! )?;
//! println!("{}", sdkify::write_descriptor(&converted.descriptor)?);
//! ```

mod baseline;
mod batch;
pub mod condition;
mod convert;
mod descriptor;
#[cfg(feature = "descriptor-xml")]
mod descriptor_xml;
mod diff;
mod error_codes;
mod facts;
mod moniker;
mod options;
mod oracle;
mod project;

pub use baseline::{
    synthesize, BaselineBuilder, BaselineError, BaselineFlags, MONIKER_PROPERTY,
    MONIKER_PROPERTY_PLURAL,
};
pub use batch::{
    convert_projects, CancelFlag, ConversionRequest, ProjectOutcome, ProjectStatus,
};
pub use convert::{
    convert_project, evaluate_project, ConvertError, ConvertSummary, ConvertedProject, Converter,
};
pub use descriptor::{
    ItemEntry, ItemGroup, ItemIdentity, LegacyPackageRef, ProjectDescriptor, ProjectGroup,
    PropertyEntry, PropertyGroup,
};
#[cfg(feature = "descriptor-xml")]
pub use descriptor_xml::{
    parse_descriptor, parse_packages_config, write_descriptor, DescriptorXmlError,
};
pub use diff::{diff_projects, ChangeOp, ChangeReport};
pub use facts::{DefaultGlob, EraFacts, Facts, GlobCoverage, PACKAGES_CONFIG_FILE};
pub use moniker::{MonikerError, TargetFamily, TargetMoniker};
pub use options::ConversionOptions;
pub use oracle::{BuiltinOracle, EvaluateError, EvaluationOracle};
pub use project::{
    BaselineProject, ConfiguredProject, DesktopFramework, EvaluatedItem, EvaluatedProperty,
    ProjectKind, ProjectLanguage, UnconfiguredProject,
};
