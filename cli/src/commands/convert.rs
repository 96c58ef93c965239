use crate::commands::load_request;
use crate::discover;
use crate::writer;
use anyhow::{bail, Context, Result};
use sdkify::{
    convert_projects, CancelFlag, ConversionOptions, ConversionRequest, Facts, ProjectStatus,
    BuiltinOracle,
};
use std::path::Path;
use std::process::ExitCode;

pub fn run(
    path: Option<&str>,
    target_framework: &str,
    keep_current_tfm: bool,
    force_web_conversion: bool,
    no_backup: bool,
    dry_run: bool,
) -> Result<ExitCode> {
    let options = ConversionOptions {
        target_moniker: target_framework.to_string(),
        keep_existing_moniker: keep_current_tfm,
        force_web_project: force_web_conversion,
        no_backup,
    };
    // Reject a bad moniker before touching any file.
    options
        .target()
        .with_context(|| format!("invalid target framework '{target_framework}'"))?;

    let root = Path::new(path.unwrap_or("."));
    let files = discover::find_project_files(root)?;
    if files.is_empty() {
        bail!("no project files found under '{}'", root.display());
    }

    let requests: Vec<ConversionRequest> = files
        .iter()
        .map(|file| load_request(file))
        .collect::<Result<_>>()?;

    let outcomes = convert_projects(
        requests,
        &options,
        Facts::builtin(),
        &BuiltinOracle::new(),
        &CancelFlag::new(),
    );

    let mut failures = 0usize;
    let mut warned = false;
    for (outcome, file) in outcomes.iter().zip(&files) {
        match &outcome.status {
            ProjectStatus::Converted(converted) => {
                for warning in &converted.summary.warnings {
                    eprintln!("Warning: {warning}");
                    warned = true;
                }
                let xml = sdkify::write_descriptor(&converted.descriptor)
                    .with_context(|| format!("failed to serialize '{}'", outcome.name))?;
                if dry_run {
                    println!("{xml}");
                } else {
                    writer::write_project_file(file, &xml, options.no_backup)?;
                    println!("Converted {}", outcome.name);
                }
            }
            ProjectStatus::Failed(e) => {
                eprintln!("Error: {} ({})", e, outcome.name);
                failures += 1;
            }
            ProjectStatus::Skipped => eprintln!("Skipped {}", outcome.name),
        }
    }

    if failures > 0 {
        return Ok(ExitCode::from(3));
    }
    if !dry_run {
        println!("Conversion complete!");
    }
    Ok(if warned {
        ExitCode::from(1)
    } else {
        ExitCode::from(0)
    })
}
