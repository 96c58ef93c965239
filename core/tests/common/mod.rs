//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use sdkify::{
    convert_project, evaluate_project, BuiltinOracle, ConversionOptions, ConvertError,
    ConvertedProject, Facts, ItemEntry, ItemGroup, ProjectDescriptor, ProjectGroup,
    ProjectLanguage, PropertyEntry, PropertyGroup, UnconfiguredProject,
};
use std::sync::Arc;

pub fn props(entries: &[(&str, &str)]) -> ProjectGroup {
    let mut group = PropertyGroup::new();
    for (name, value) in entries {
        group.properties.push(PropertyEntry::new(*name, *value));
    }
    ProjectGroup::Properties(group)
}

pub fn props_with_condition(condition: &str, entries: &[(&str, &str)]) -> ProjectGroup {
    let mut group = PropertyGroup::with_condition(condition);
    for (name, value) in entries {
        group.properties.push(PropertyEntry::new(*name, *value));
    }
    ProjectGroup::Properties(group)
}

pub fn items(entries: Vec<ItemEntry>) -> ProjectGroup {
    let mut group = ItemGroup::new();
    group.items = entries;
    ProjectGroup::Items(group)
}

pub fn items_with_condition(condition: &str, entries: Vec<ItemEntry>) -> ProjectGroup {
    let mut group = ItemGroup::new();
    group.condition = Some(condition.to_string());
    group.items = entries;
    ProjectGroup::Items(group)
}

/// A typical legacy executable descriptor: framework-era properties, an
/// explicit compile list, and a couple of framework references.
pub fn legacy_exe_descriptor() -> ProjectDescriptor {
    ProjectDescriptor {
        sdk: None,
        groups: vec![
            props(&[
                ("ProjectGuid", "{6E6A77F1-5CB3-4DBB-9FB2-C85A0BF6F04D}"),
                ("OutputType", "Exe"),
                ("TargetFrameworkVersion", "v4.7.2"),
                ("FileAlignment", "512"),
            ]),
            items(vec![
                ItemEntry::include("Reference", "System"),
                ItemEntry::include("Reference", "System.Core"),
            ]),
            items(vec![
                ItemEntry::include("Compile", "Program.cs"),
                ItemEntry::include("Compile", "Properties\\AssemblyInfo.cs"),
            ]),
        ],
        legacy_package_refs: Vec::new(),
    }
}

pub fn convert(
    descriptor: ProjectDescriptor,
    options: &ConversionOptions,
) -> Result<ConvertedProject, ConvertError> {
    convert_project(
        "test.csproj",
        ProjectLanguage::CSharp,
        Arc::new(descriptor),
        options,
        Facts::builtin(),
        &BuiltinOracle::new(),
    )
}

pub fn convert_to(descriptor: ProjectDescriptor, target: &str) -> ConvertedProject {
    convert(descriptor, &ConversionOptions::with_target(target))
        .expect("conversion should succeed")
}

pub fn evaluate(descriptor: ProjectDescriptor, target: &str) -> UnconfiguredProject {
    evaluate_project(
        "test.csproj",
        ProjectLanguage::CSharp,
        Arc::new(descriptor),
        &ConversionOptions::with_target(target),
        Facts::builtin(),
        &BuiltinOracle::new(),
    )
    .expect("evaluation should succeed")
}

/// All unconditional property entries of a converted tree as (name, value)
/// pairs, in document order.
pub fn flat_properties(descriptor: &ProjectDescriptor) -> Vec<(String, String)> {
    descriptor
        .properties()
        .filter(|(_, group_cond)| group_cond.is_none())
        .map(|(p, _)| (p.name.clone(), p.value.clone()))
        .collect()
}

pub fn has_property(descriptor: &ProjectDescriptor, name: &str) -> bool {
    descriptor
        .properties()
        .any(|(p, _)| p.name.eq_ignore_ascii_case(name))
}

/// All item entries of a given type, any group.
pub fn items_of_type<'a>(descriptor: &'a ProjectDescriptor, item_type: &str) -> Vec<&'a ItemEntry> {
    let item_type = item_type.to_ascii_lowercase();
    descriptor
        .items()
        .map(|(i, _)| i)
        .filter(|i| i.item_type.to_ascii_lowercase() == item_type)
        .collect()
}
