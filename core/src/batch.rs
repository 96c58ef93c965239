//! Batch conversion driver.
//!
//! Projects carry no shared mutable state, so a batch is embarrassingly
//! parallel: with the `parallel` feature each project converts on its own
//! rayon worker, sharing only the read-only fact tables. One project's hard
//! error never aborts the batch; every request produces an outcome.
//!
//! Cancellation is cooperative and coarse: a [`CancelFlag`] skips projects
//! whose conversion has not started yet. In-flight conversions are never
//! interrupted — each one is short-lived and non-resumable.

use crate::convert::{convert_project, ConvertError, ConvertedProject};
use crate::descriptor::ProjectDescriptor;
use crate::facts::Facts;
use crate::options::ConversionOptions;
use crate::oracle::EvaluationOracle;
use crate::project::ProjectLanguage;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// One project to convert.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Project identity for outcomes and error context (typically the file
    /// path).
    pub name: String,
    pub language: ProjectLanguage,
    pub descriptor: Arc<ProjectDescriptor>,
}

/// Shared flag to skip not-yet-started conversions.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-project batch result.
#[derive(Debug)]
pub struct ProjectOutcome {
    pub name: String,
    pub status: ProjectStatus,
}

#[derive(Debug)]
pub enum ProjectStatus {
    Converted(ConvertedProject),
    Failed(ConvertError),
    /// Skipped because the batch was cancelled before this project started.
    Skipped,
}

impl ProjectStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProjectStatus::Failed(_))
    }
}

/// Convert a batch of projects. Outcomes are returned in request order.
pub fn convert_projects<O>(
    requests: Vec<ConversionRequest>,
    options: &ConversionOptions,
    facts: &Facts,
    oracle: &O,
    cancel: &CancelFlag,
) -> Vec<ProjectOutcome>
where
    O: EvaluationOracle + Sync,
{
    let run_one = |request: ConversionRequest| -> ProjectOutcome {
        if cancel.is_cancelled() {
            return ProjectOutcome {
                name: request.name,
                status: ProjectStatus::Skipped,
            };
        }
        info!(project = %request.name, "converting");
        let status = match convert_project(
            &request.name,
            request.language,
            request.descriptor,
            options,
            facts,
            oracle,
        ) {
            Ok(converted) => ProjectStatus::Converted(converted),
            Err(e) => {
                warn!(project = %request.name, error = %e, "conversion failed");
                ProjectStatus::Failed(e)
            }
        };
        ProjectOutcome {
            name: request.name,
            status,
        }
    };

    #[cfg(feature = "parallel")]
    {
        requests.into_par_iter().map(run_one).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        requests.into_iter().map(run_one).collect()
    }
}
