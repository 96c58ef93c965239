//! Full markup-to-markup conversion: legacy project XML in, SDK-style XML
//! out.

mod common;

use common::convert;
use sdkify::ConversionOptions;

const LEGACY_CONSOLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <Import Project="$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props" />
  <PropertyGroup>
    <Configuration Condition=" '$(Configuration)' == '' ">Debug</Configuration>
    <ProjectGuid>{9A19103F-16F7-4668-BE54-9A1E7A4F7556}</ProjectGuid>
    <OutputType>Exe</OutputType>
    <RootNamespace>Legacy.Console</RootNamespace>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <FileAlignment>512</FileAlignment>
    <Deterministic>true</Deterministic>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="System.Core" />
    <Reference Include="Newtonsoft.Json, Version=12.0.0.0, Culture=neutral, processorArchitecture=MSIL">
      <HintPath>packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll</HintPath>
    </Reference>
  </ItemGroup>
  <ItemGroup>
    <Compile Include="Program.cs" />
    <Compile Include="Properties\AssemblyInfo.cs" />
    <None Include="packages.config" />
  </ItemGroup>
  <Target Name="BeforeBuild" />
</Project>
"#;

const PACKAGES_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net472" />
</packages>
"#;

#[test]
fn legacy_console_project_converts_to_minimal_sdk_markup() {
    let mut descriptor = sdkify::parse_descriptor(LEGACY_CONSOLE).unwrap();
    descriptor.legacy_package_refs = sdkify::parse_packages_config(PACKAGES_CONFIG).unwrap();

    let converted = convert(descriptor, &ConversionOptions::with_target("net5.0")).unwrap();
    assert!(converted.summary.complete);

    let xml = sdkify::write_descriptor(&converted.descriptor).unwrap();

    assert!(xml.starts_with(r#"<Project Sdk="Microsoft.NET.Sdk">"#));
    assert!(xml.contains("<TargetFramework>net5.0</TargetFramework>"));
    assert!(xml.contains("<OutputType>Exe</OutputType>"));
    assert!(xml.contains("<RootNamespace>Legacy.Console</RootNamespace>"));
    assert!(xml.contains(r#"<PackageReference Include="Newtonsoft.Json">"#));
    assert!(xml.contains("<Version>12.0.3</Version>"));

    assert!(!xml.contains("TargetFrameworkVersion"));
    assert!(!xml.contains("ProjectGuid"));
    assert!(!xml.contains("FileAlignment"));
    assert!(!xml.contains("AssemblyInfo.cs"));
    assert!(!xml.contains("packages.config"));
    // The hint-path reference is satisfied by the migrated package.
    assert!(!xml.contains("HintPath"));
    assert!(!xml.contains(r#"<Reference"#));
}

#[test]
fn converted_markup_survives_a_second_conversion_unchanged() {
    let mut descriptor = sdkify::parse_descriptor(LEGACY_CONSOLE).unwrap();
    descriptor.legacy_package_refs = sdkify::parse_packages_config(PACKAGES_CONFIG).unwrap();

    let once = convert(descriptor, &ConversionOptions::with_target("net5.0")).unwrap();
    let xml_once = sdkify::write_descriptor(&once.descriptor).unwrap();

    let reparsed = sdkify::parse_descriptor(&xml_once).unwrap();
    let twice = convert(reparsed, &ConversionOptions::with_target("net5.0")).unwrap();
    let xml_twice = sdkify::write_descriptor(&twice.descriptor).unwrap();

    assert_eq!(xml_once, xml_twice);
}
