mod commands;
mod discover;
mod output;
mod writer;

use clap::{Parser, Subcommand, ValueEnum};
use sdkify::{ConvertError, DescriptorXmlError, EvaluateError, MonikerError};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sdkify")]
#[command(about = "Convert legacy MSBuild-style projects to SDK-style")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Convert projects in place (or print with --dry-run)")]
    Convert {
        #[arg(help = "Path to a project file, or a directory to search for projects")]
        path: Option<String>,
        #[arg(
            long,
            short = 't',
            value_name = "TFM",
            default_value = "netcoreapp3.1",
            help = "Target framework moniker to upgrade to"
        )]
        target_framework: String,
        #[arg(long, help = "Keep the TargetFramework already set in the project")]
        keep_current_tfm: bool,
        #[arg(long, help = "Treat projects as web projects regardless of detection")]
        force_web_conversion: bool,
        #[arg(long, help = "Do not write .old backup copies of the originals")]
        no_backup: bool,
        #[arg(long, help = "Print converted projects to stdout instead of writing")]
        dry_run: bool,
    },
    #[command(about = "Diff a project against its SDK baseline; no conversion is done")]
    Diff {
        #[arg(help = "Path to the project file")]
        path: String,
        #[arg(
            long,
            short = 't',
            value_name = "TFM",
            default_value = "netcoreapp3.1",
            help = "Target framework moniker to compare against"
        )]
        target_framework: String,
        #[arg(long, short, value_enum, default_value = "text", help = "Output format")]
        format: OutputFormat,
        #[arg(long, help = "Treat the project as a web project regardless of detection")]
        force_web_conversion: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            path,
            target_framework,
            keep_current_tfm,
            force_web_conversion,
            no_backup,
            dry_run,
        } => commands::convert::run(
            path.as_deref(),
            &target_framework,
            keep_current_tfm,
            force_web_conversion,
            no_backup,
            dry_run,
        ),
        Commands::Diff {
            path,
            target_framework,
            format,
            force_web_conversion,
        } => commands::diff::run(&path, &target_framework, format, force_web_conversion),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for_error(&e)
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    if is_internal_error(err) {
        ExitCode::from(3)
    } else {
        ExitCode::from(2)
    }
}

fn is_internal_error(err: &anyhow::Error) -> bool {
    if err.chain().any(|cause| cause.is::<MonikerError>()) {
        return false;
    }
    err.chain().any(|cause| {
        if let Some(convert_err) = cause.downcast_ref::<ConvertError>() {
            return !matches!(convert_err, ConvertError::UnknownMoniker(_));
        }
        cause.is::<DescriptorXmlError>() || cause.is::<EvaluateError>()
    })
}
