//! XML loader and serializer for project descriptors.
//!
//! Bundled collaborator behind the `descriptor-xml` feature: an event-based
//! reader that builds a [`ProjectDescriptor`] from project-file markup, a
//! companion parser for the legacy `packages.config` sidecar, and a writer
//! that emits deterministic, 2-space-indented SDK-style XML.
//!
//! The reader is tolerant of constructs the conversion core does not model
//! (`Import`, `Target`, `UsingTask`, ...): they are skipped, not errors.

use crate::descriptor::{
    ItemEntry, ItemGroup, LegacyPackageRef, ProjectDescriptor, ProjectGroup, PropertyEntry,
    PropertyGroup,
};
use crate::error_codes;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescriptorXmlError {
    #[error("[SDKIFY_XML_001] malformed descriptor markup: {0}. Suggestion: check the file is valid XML.")]
    Malformed(String),

    #[error("[SDKIFY_XML_002] unexpected descriptor structure: {0}")]
    UnexpectedStructure(String),

    #[error("[SDKIFY_XML_003] failed to serialize descriptor: {0}")]
    Write(String),
}

impl DescriptorXmlError {
    pub fn code(&self) -> &'static str {
        match self {
            DescriptorXmlError::Malformed(_) => error_codes::XML_MALFORMED,
            DescriptorXmlError::UnexpectedStructure(_) => error_codes::XML_UNEXPECTED_STRUCTURE,
            DescriptorXmlError::Write(_) => error_codes::XML_WRITE,
        }
    }
}

fn to_xml_err(err: quick_xml::Error) -> DescriptorXmlError {
    DescriptorXmlError::Malformed(err.to_string())
}

/// Parse project-file markup into a descriptor tree.
pub fn parse_descriptor(xml: &str) -> Result<ProjectDescriptor, DescriptorXmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut descriptor = ProjectDescriptor::new();
    let mut saw_project = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(to_xml_err)? {
            Event::Start(e) if e.local_name().as_ref() == b"Project" => {
                saw_project = true;
                descriptor.sdk = attribute(&e, b"Sdk")?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"PropertyGroup" => {
                let condition = attribute(&e, b"Condition")?;
                let group = parse_property_group(&mut reader, condition)?;
                descriptor.groups.push(ProjectGroup::Properties(group));
            }
            Event::Start(e) if e.local_name().as_ref() == b"ItemGroup" => {
                let condition = attribute(&e, b"Condition")?;
                let group = parse_item_group(&mut reader, condition)?;
                descriptor.groups.push(ProjectGroup::Items(group));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"PropertyGroup" => {
                descriptor.groups.push(ProjectGroup::Properties(PropertyGroup {
                    condition: attribute(&e, b"Condition")?,
                    properties: Vec::new(),
                }));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"ItemGroup" => {
                descriptor.groups.push(ProjectGroup::Items(ItemGroup {
                    condition: attribute(&e, b"Condition")?,
                    items: Vec::new(),
                }));
            }
            // Imports, targets and the rest of the language are outside
            // the model; skip their subtrees wholesale.
            Event::Start(e) => {
                let name = e.to_owned();
                reader
                    .read_to_end_into(name.name(), &mut Vec::new())
                    .map_err(to_xml_err)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_project {
        return Err(DescriptorXmlError::UnexpectedStructure(
            "no <Project> root element".to_string(),
        ));
    }
    Ok(descriptor)
}

fn parse_property_group(
    reader: &mut Reader<&[u8]>,
    condition: Option<String>,
) -> Result<PropertyGroup, DescriptorXmlError> {
    let mut group = PropertyGroup {
        condition,
        properties: Vec::new(),
    };
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(to_xml_err)? {
            Event::Start(e) => {
                let name = element_name(&e)?;
                let entry_condition = attribute(&e, b"Condition")?;
                let end = e.to_owned();
                let value = reader
                    .read_text(end.name())
                    .map_err(to_xml_err)?
                    .into_owned();
                group.properties.push(PropertyEntry {
                    name,
                    value,
                    condition: entry_condition,
                });
            }
            Event::Empty(e) => {
                group.properties.push(PropertyEntry {
                    name: element_name(&e)?,
                    value: String::new(),
                    condition: attribute(&e, b"Condition")?,
                });
            }
            Event::End(e) if e.local_name().as_ref() == b"PropertyGroup" => break,
            Event::Eof => {
                return Err(DescriptorXmlError::Malformed(
                    "unterminated PropertyGroup".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(group)
}

fn parse_item_group(
    reader: &mut Reader<&[u8]>,
    condition: Option<String>,
) -> Result<ItemGroup, DescriptorXmlError> {
    let mut group = ItemGroup {
        condition,
        items: Vec::new(),
    };
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(to_xml_err)? {
            Event::Empty(e) => {
                group.items.push(item_from_element(&e)?);
            }
            Event::Start(e) => {
                let mut item = item_from_element(&e)?;
                parse_item_metadata(reader, &e.to_owned(), &mut item)?;
                group.items.push(item);
            }
            Event::End(e) if e.local_name().as_ref() == b"ItemGroup" => break,
            Event::Eof => {
                return Err(DescriptorXmlError::Malformed(
                    "unterminated ItemGroup".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(group)
}

fn item_from_element(e: &BytesStart) -> Result<ItemEntry, DescriptorXmlError> {
    Ok(ItemEntry {
        item_type: element_name(e)?,
        include: attribute(e, b"Include")?,
        exclude: attribute(e, b"Exclude")?,
        update: attribute(e, b"Update")?,
        remove: attribute(e, b"Remove")?,
        condition: attribute(e, b"Condition")?,
        metadata: Vec::new(),
    })
}

fn parse_item_metadata(
    reader: &mut Reader<&[u8]>,
    open: &BytesStart<'static>,
    item: &mut ItemEntry,
) -> Result<(), DescriptorXmlError> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(to_xml_err)? {
            Event::Start(e) => {
                let key = element_name(&e)?;
                let end = e.to_owned();
                let value = reader
                    .read_text(end.name())
                    .map_err(to_xml_err)?
                    .into_owned();
                item.metadata.push((key, value));
            }
            Event::Empty(e) => {
                item.metadata.push((element_name(&e)?, String::new()));
            }
            Event::End(e) if e.local_name().as_ref() == open.local_name().as_ref() => break,
            Event::Eof => {
                return Err(DescriptorXmlError::Malformed(format!(
                    "unterminated item element '{}'",
                    item.item_type
                )))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn element_name(e: &BytesStart) -> Result<String, DescriptorXmlError> {
    String::from_utf8(e.local_name().as_ref().to_vec())
        .map_err(|_| DescriptorXmlError::Malformed("non-UTF-8 element name".to_string()))
}

fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>, DescriptorXmlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DescriptorXmlError::Malformed(err.to_string()))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(to_xml_err)?
                .into_owned();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Parse the legacy `packages.config` sidecar.
pub fn parse_packages_config(xml: &str) -> Result<Vec<LegacyPackageRef>, DescriptorXmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut refs = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(to_xml_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"package" => {
                let id = attribute(&e, b"id")?.ok_or_else(|| {
                    DescriptorXmlError::UnexpectedStructure(
                        "package element without id".to_string(),
                    )
                })?;
                let version = attribute(&e, b"version")?.unwrap_or_default();
                refs.push(LegacyPackageRef { id, version });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(refs)
}

/// Serialize a descriptor as SDK-style XML: 2-space indent, self-closing
/// items without metadata, no XML declaration. Output is deterministic for
/// a given tree.
pub fn write_descriptor(descriptor: &ProjectDescriptor) -> Result<String, DescriptorXmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let write_err = |err: std::io::Error| DescriptorXmlError::Write(err.to_string());

    let mut project = BytesStart::new("Project");
    if let Some(sdk) = &descriptor.sdk {
        project.push_attribute(("Sdk", sdk.as_str()));
    }
    writer
        .write_event(Event::Start(project.borrow()))
        .map_err(write_err)?;

    for group in &descriptor.groups {
        match group {
            ProjectGroup::Properties(g) => write_property_group(&mut writer, g).map_err(write_err)?,
            ProjectGroup::Items(g) => write_item_group(&mut writer, g).map_err(write_err)?,
        }
    }

    writer
        .write_event(Event::End(project.to_end()))
        .map_err(write_err)?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    String::from_utf8(out)
        .map_err(|_| DescriptorXmlError::Write("serialized descriptor is not UTF-8".to_string()))
}

fn write_property_group(
    writer: &mut Writer<Vec<u8>>,
    group: &PropertyGroup,
) -> std::io::Result<()> {
    let mut open = BytesStart::new("PropertyGroup");
    if let Some(cond) = &group.condition {
        open.push_attribute(("Condition", cond.as_str()));
    }
    writer.write_event(Event::Start(open.borrow()))?;
    for property in &group.properties {
        let mut element = BytesStart::new(property.name.as_str());
        if let Some(cond) = &property.condition {
            element.push_attribute(("Condition", cond.as_str()));
        }
        if property.value.is_empty() {
            writer.write_event(Event::Empty(element))?;
        } else {
            writer.write_event(Event::Start(element.borrow()))?;
            writer.write_event(Event::Text(BytesText::new(&property.value)))?;
            writer.write_event(Event::End(element.to_end()))?;
        }
    }
    writer.write_event(Event::End(open.to_end()))
}

fn write_item_group(writer: &mut Writer<Vec<u8>>, group: &ItemGroup) -> std::io::Result<()> {
    let mut open = BytesStart::new("ItemGroup");
    if let Some(cond) = &group.condition {
        open.push_attribute(("Condition", cond.as_str()));
    }
    writer.write_event(Event::Start(open.borrow()))?;
    for item in &group.items {
        let mut element = BytesStart::new(item.item_type.as_str());
        for (attr, value) in [
            ("Include", &item.include),
            ("Update", &item.update),
            ("Remove", &item.remove),
            ("Exclude", &item.exclude),
            ("Condition", &item.condition),
        ] {
            if let Some(value) = value {
                element.push_attribute((attr, value.as_str()));
            }
        }
        if item.metadata.is_empty() {
            writer.write_event(Event::Empty(element))?;
        } else {
            writer.write_event(Event::Start(element.borrow()))?;
            for (key, value) in &item.metadata {
                let child = BytesStart::new(key.as_str());
                writer.write_event(Event::Start(child.borrow()))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                writer.write_event(Event::End(child.to_end()))?;
            }
            writer.write_event(Event::End(element.to_end()))?;
        }
    }
    writer.write_event(Event::End(open.to_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <Import Project="$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <RootNamespace>Legacy.App</RootNamespace>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' ">
    <Optimize>false</Optimize>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Program.cs" />
    <None Include="App.config">
      <CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>
    </None>
  </ItemGroup>
  <Target Name="BeforeBuild" />
</Project>
"#;

    #[test]
    fn parses_legacy_descriptor() {
        let descriptor = parse_descriptor(LEGACY).unwrap();
        assert_eq!(descriptor.sdk, None);
        assert_eq!(descriptor.groups.len(), 3);

        let first = descriptor.groups[0].as_properties().unwrap();
        assert_eq!(first.condition, None);
        assert_eq!(first.properties.len(), 3);
        assert_eq!(first.properties[0].name, "OutputType");
        assert_eq!(first.properties[0].value, "Exe");

        let second = descriptor.groups[1].as_properties().unwrap();
        assert_eq!(
            second.condition.as_deref(),
            Some(" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' ")
        );

        let items = descriptor.groups[2].as_items().unwrap();
        assert_eq!(items.items.len(), 2);
        assert_eq!(items.items[0].item_type, "Compile");
        assert_eq!(items.items[0].include.as_deref(), Some("Program.cs"));
        assert_eq!(
            items.items[1].metadata,
            vec![("CopyToOutputDirectory".to_string(), "PreserveNewest".to_string())]
        );
    }

    #[test]
    fn parses_sdk_attribute() {
        let descriptor =
            parse_descriptor(r#"<Project Sdk="Microsoft.NET.Sdk"><PropertyGroup/></Project>"#)
                .unwrap();
        assert_eq!(descriptor.sdk.as_deref(), Some("Microsoft.NET.Sdk"));
        assert_eq!(descriptor.groups.len(), 1);
    }

    #[test]
    fn rejects_non_project_documents() {
        let err = parse_descriptor("<packages></packages>").unwrap_err();
        assert_eq!(err.code(), "SDKIFY_XML_002");
    }

    #[test]
    fn parses_packages_config() {
        let refs = parse_packages_config(
            r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net472" />
  <package id="PackageA" version="1.2.3" />
</packages>
"#,
        )
        .unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].id, "PackageA");
        assert_eq!(refs[1].version, "1.2.3");
    }

    #[test]
    fn writes_sdk_style_output() {
        let descriptor = parse_descriptor(
            r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net5.0</TargetFramework>
    <OutputType>Exe</OutputType>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json">
      <Version>12.0.3</Version>
    </PackageReference>
  </ItemGroup>
</Project>
"#,
        )
        .unwrap();
        let xml = write_descriptor(&descriptor).unwrap();
        assert!(xml.starts_with(r#"<Project Sdk="Microsoft.NET.Sdk">"#));
        assert!(xml.contains("  <PropertyGroup>"));
        assert!(xml.contains("    <TargetFramework>net5.0</TargetFramework>"));
        assert!(xml.contains(r#"<PackageReference Include="Newtonsoft.Json">"#));
        assert!(xml.ends_with("</Project>\n"));

        // Writing is deterministic and stable across a parse round-trip.
        let reparsed = parse_descriptor(&xml).unwrap();
        assert_eq!(reparsed, descriptor);
        assert_eq!(write_descriptor(&reparsed).unwrap(), xml);
    }

    #[test]
    fn escapes_attribute_and_text_content() {
        let mut descriptor = ProjectDescriptor::new();
        let mut group = PropertyGroup::new();
        group.properties.push(PropertyEntry::new(
            "DefineConstants",
            "TRACE;A<B&C",
        ));
        group.condition = Some("'$(A)' == 'x&y'".to_string());
        descriptor.groups.push(ProjectGroup::Properties(group));

        let xml = write_descriptor(&descriptor).unwrap();
        assert!(xml.contains("TRACE;A&lt;B&amp;C"));
        let back = parse_descriptor(&xml).unwrap();
        assert_eq!(back, descriptor);
    }
}
