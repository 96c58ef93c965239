use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn sdkify_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sdkify"))
}

const LEGACY_CONSOLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <ProjectGuid>{9A19103F-16F7-4668-BE54-9A1E7A4F7556}</ProjectGuid>
    <OutputType>Exe</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <FileAlignment>512</FileAlignment>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="System.Core" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="Program.cs" />
    <None Include="packages.config" />
  </ItemGroup>
</Project>
"#;

const PACKAGES_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net472" />
</packages>
"#;

fn write_legacy_project(dir: &Path) -> std::path::PathBuf {
    let project = dir.join("App.csproj");
    fs::write(&project, LEGACY_CONSOLE).unwrap();
    fs::write(dir.join("packages.config"), PACKAGES_CONFIG).unwrap();
    project
}

#[test]
fn dry_run_prints_sdk_markup_without_writing() {
    let dir = TempDir::new().unwrap();
    let project = write_legacy_project(dir.path());

    let output = sdkify_cmd()
        .args([
            "convert",
            project.to_str().unwrap(),
            "--target-framework",
            "net5.0",
            "--dry-run",
        ])
        .output()
        .expect("failed to run sdkify");

    assert!(
        output.status.success(),
        "dry run should exit 0: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#"<Project Sdk="Microsoft.NET.Sdk">"#));
    assert!(stdout.contains("<TargetFramework>net5.0</TargetFramework>"));
    assert!(!stdout.contains("TargetFrameworkVersion"));
    assert!(stdout.contains(r#"<PackageReference Include="Newtonsoft.Json">"#));

    // The file on disk is untouched and no backup was made.
    assert_eq!(fs::read_to_string(&project).unwrap(), LEGACY_CONSOLE);
    assert!(!dir.path().join("App.csproj.old").exists());
}

#[test]
fn convert_rewrites_in_place_with_backup() {
    let dir = TempDir::new().unwrap();
    let project = write_legacy_project(dir.path());

    let output = sdkify_cmd()
        .args(["convert", project.to_str().unwrap(), "-t", "net5.0"])
        .output()
        .expect("failed to run sdkify");

    assert!(
        output.status.success(),
        "convert should exit 0: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Conversion complete!"));

    let rewritten = fs::read_to_string(&project).unwrap();
    assert!(rewritten.starts_with(r#"<Project Sdk="Microsoft.NET.Sdk">"#));
    assert!(!rewritten.contains("ProjectGuid"));

    let backup = fs::read_to_string(dir.path().join("App.csproj.old")).unwrap();
    assert_eq!(backup, LEGACY_CONSOLE);
}

#[test]
fn no_backup_skips_the_old_copy() {
    let dir = TempDir::new().unwrap();
    let project = write_legacy_project(dir.path());

    let output = sdkify_cmd()
        .args(["convert", project.to_str().unwrap(), "-t", "net5.0", "--no-backup"])
        .output()
        .expect("failed to run sdkify");

    assert!(output.status.success());
    assert!(!dir.path().join("App.csproj.old").exists());
}

#[test]
fn convert_discovers_projects_under_a_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("src").join("App");
    fs::create_dir_all(&nested).unwrap();
    let project = write_legacy_project(&nested);

    let output = sdkify_cmd()
        .args(["convert", dir.path().to_str().unwrap(), "-t", "net5.0"])
        .output()
        .expect("failed to run sdkify");

    assert!(
        output.status.success(),
        "directory convert should exit 0: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let rewritten = fs::read_to_string(&project).unwrap();
    assert!(rewritten.contains("<TargetFramework>net5.0</TargetFramework>"));
}

#[test]
fn bad_moniker_exits_2() {
    let dir = TempDir::new().unwrap();
    let project = write_legacy_project(dir.path());

    let output = sdkify_cmd()
        .args(["convert", project.to_str().unwrap(), "-t", "banana"])
        .output()
        .expect("failed to run sdkify");

    assert_eq!(
        output.status.code(),
        Some(2),
        "bad moniker should exit 2: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("SDKIFY_TFM_001"));
    // Nothing was written.
    assert_eq!(fs::read_to_string(&project).unwrap(), LEGACY_CONSOLE);
}

#[test]
fn empty_directory_exits_2() {
    let dir = TempDir::new().unwrap();
    let output = sdkify_cmd()
        .args(["convert", dir.path().to_str().unwrap()])
        .output()
        .expect("failed to run sdkify");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn diff_reports_differences_with_exit_1() {
    let dir = TempDir::new().unwrap();
    let project = write_legacy_project(dir.path());

    let output = sdkify_cmd()
        .args(["diff", project.to_str().unwrap(), "-t", "net5.0"])
        .output()
        .expect("failed to run sdkify");

    assert_eq!(
        output.status.code(),
        Some(1),
        "legacy project should differ from its baseline: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Properties:"));
    assert!(stdout.contains("OutputType"));
}

#[test]
fn diff_of_a_minimal_sdk_project_exits_0() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("Lib.csproj");
    fs::write(
        &project,
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <TargetFramework>net5.0</TargetFramework>\n  </PropertyGroup>\n</Project>\n",
    )
    .unwrap();

    let output = sdkify_cmd()
        .args(["diff", project.to_str().unwrap(), "-t", "net5.0"])
        .output()
        .expect("failed to run sdkify");

    assert!(
        output.status.success(),
        "baseline-equal project should exit 0: stdout={}, stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("No differences found."));
}

#[test]
fn diff_json_output_is_a_versioned_report() {
    let dir = TempDir::new().unwrap();
    let project = write_legacy_project(dir.path());

    let output = sdkify_cmd()
        .args([
            "diff",
            project.to_str().unwrap(),
            "-t",
            "net5.0",
            "--format",
            "json",
        ])
        .output()
        .expect("failed to run sdkify");

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(report["version"], "1");
    assert_eq!(report["complete"], true);
    assert!(report["changes"].as_array().is_some_and(|c| !c.is_empty()));
}
