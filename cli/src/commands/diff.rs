use crate::commands::load_request;
use crate::output::{json, text};
use crate::OutputFormat;
use anyhow::{anyhow, Context, Result};
use sdkify::{diff_projects, BaselineBuilder, BuiltinOracle, ConversionOptions, Facts};
use std::io;
use std::path::Path;
use std::process::ExitCode;

pub fn run(
    path: &str,
    target_framework: &str,
    format: OutputFormat,
    force_web_conversion: bool,
) -> Result<ExitCode> {
    let options = ConversionOptions {
        target_moniker: target_framework.to_string(),
        force_web_project: force_web_conversion,
        ..ConversionOptions::default()
    };
    options
        .target()
        .with_context(|| format!("invalid target framework '{target_framework}'"))?;

    let request = load_request(Path::new(path))?;
    let facts = Facts::builtin();
    let oracle = BuiltinOracle::new();

    let project = sdkify::evaluate_project(
        &request.name,
        request.language,
        request.descriptor,
        &options,
        facts,
        &oracle,
    )
    .with_context(|| format!("failed to evaluate '{path}'"))?;
    let baseline = BaselineBuilder::new(facts)
        .build(&project, &options, &oracle)
        .with_context(|| format!("failed to build SDK baseline for '{path}'"))?;

    let left = project
        .first_configured()
        .ok_or_else(|| anyhow!("project '{path}' has no configured state"))?;
    let right = baseline
        .first_configured()
        .ok_or_else(|| anyhow!("baseline for '{path}' has no configured state"))?;

    let report = diff_projects(left, right);

    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Text => {
            text::write_text_report(&mut handle, &report, path, &options.target_moniker)?
        }
        OutputFormat::Json => json::write_json_report(&mut handle, &report)?,
    }

    if report.is_empty() && report.complete {
        Ok(ExitCode::from(0))
    } else {
        Ok(ExitCode::from(1))
    }
}
