//! Project file discovery.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static PROJECT_GLOBS: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["*.csproj", "*.vbproj", "*.fsproj"] {
        builder.add(Glob::new(pattern).expect("built-in glob patterns are valid"));
    }
    builder.build().expect("built-in glob set builds")
});

/// Resolve a path argument to the list of project files to operate on:
/// the file itself, or every project file under a directory (sorted for
/// reproducible batch order).
pub fn find_project_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if !is_project_file(path) {
            bail!(
                "'{}' is not a recognized project file (expected .csproj, .vbproj, or .fsproj)",
                path.display()
            );
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        bail!("path '{}' does not exist", path.display());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(path).follow_links(false) {
        let entry =
            entry.with_context(|| format!("failed to walk directory '{}'", path.display()))?;
        if entry.file_type().is_file() && is_project_file(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_project_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| PROJECT_GLOBS.is_match(Path::new(name)))
        .unwrap_or(false)
}
