//! Atomic project file output.
//!
//! Writes go to a temporary file in the destination directory followed by
//! an atomic rename, so a crash mid-write can never corrupt the original.
//! Unless backups are disabled, the original is first copied to
//! `<name>.old` next to it.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn write_project_file(path: &Path, contents: &str, no_backup: bool) -> Result<()> {
    if !no_backup && path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup).with_context(|| {
            format!("failed to back up '{}' to '{}'", path.display(), backup.display())
        })?;
        debug!(backup = %backup.display(), "wrote backup");
    }

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new(),
    }
    .context("failed to create temporary file for atomic write")?;

    tmp.write_all(contents.as_bytes())
        .context("failed to write converted project")?;
    tmp.flush().context("failed to flush converted project")?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace '{}'", path.display()))?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.old"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.csproj");
        fs::write(&path, "original").unwrap();

        write_project_file(&path, "converted", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "converted");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.csproj.old")).unwrap(),
            "original"
        );
    }

    #[test]
    fn no_backup_skips_the_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.csproj");
        fs::write(&path, "original").unwrap();

        write_project_file(&path, "converted", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "converted");
        assert!(!dir.path().join("app.csproj.old").exists());
    }
}
