//! Build-then-swap publishing of the API tree.
//!
//! A run writes into `<output>.staging`; only `publish` moves it over the
//! live `<output>`, so readers never see a half-written tree.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use golf_schema::{paths, ResourceGroup};

use crate::PipelineError;

#[derive(Debug)]
pub struct Snapshot {
    target: PathBuf,
    staging: PathBuf,
}

impl Snapshot {
    /// Prepares an empty staging directory next to `target`, clearing any
    /// leftover from an aborted run.
    pub fn begin(target: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let target = target.as_ref().to_path_buf();
        let staging = sibling(&target, "staging")?;
        let previous = sibling(&target, "previous")?;
        for dir in [&target, &staging, &previous] {
            ensure_replaceable(dir)?;
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| create_err(parent, e))?;
        }
        if staging.exists() {
            log::warn!("removing stale staging directory {}", staging.display());
            fs::remove_dir_all(&staging).map_err(|e| create_err(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| create_err(&staging, e))?;

        Ok(Self { target, staging })
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    pub fn target_dir(&self) -> &Path {
        &self.target
    }

    /// Swaps the staged tree into place and drops the previous one.
    pub fn publish(self) -> Result<PathBuf, PipelineError> {
        let previous = sibling(&self.target, "previous")?;
        ensure_replaceable(&self.target)?;
        ensure_replaceable(&previous)?;
        if previous.exists() {
            fs::remove_dir_all(&previous).map_err(|e| publish_err(&previous, e))?;
        }

        let had_previous = self.target.exists();
        if had_previous {
            fs::rename(&self.target, &previous).map_err(|e| publish_err(&self.target, e))?;
        }

        if let Err(e) = fs::rename(&self.staging, &self.target) {
            if had_previous {
                if let Err(restore) = fs::rename(&previous, &self.target) {
                    log::error!(
                        "failed to restore {} from {}: {restore}",
                        self.target.display(),
                        previous.display()
                    );
                }
            }
            return Err(publish_err(&self.target, e));
        }

        if had_previous {
            if let Err(e) = fs::remove_dir_all(&previous) {
                log::warn!("failed to remove {}: {e}", previous.display());
            }
        }
        Ok(self.target)
    }

    /// Drops the staged tree, leaving the published one untouched.
    pub fn discard(self) {
        if let Err(e) = fs::remove_dir_all(&self.staging) {
            log::warn!("failed to remove {}: {e}", self.staging.display());
        }
    }
}

/// Fails if `other` lies inside any directory a snapshot of `target` may
/// replace, or contains one of them.
pub fn ensure_disjoint(target: &Path, other: &Path) -> Result<(), PipelineError> {
    let other_abs = resolve(other);
    for dir in [
        target.to_path_buf(),
        sibling(target, "staging")?,
        sibling(target, "previous")?,
    ] {
        let dir_abs = resolve(&dir);
        if other_abs.starts_with(&dir_abs) || dir_abs.starts_with(&other_abs) {
            return Err(PipelineError::new(
                "E3007",
                format!(
                    "{} overlaps output directory {}",
                    other.display(),
                    dir.display()
                ),
            )
            .with_path(other.display().to_string()));
        }
    }
    Ok(())
}

/// A directory may be replaced when it is missing, empty, or holds nothing
/// but API tree entries.
fn ensure_replaceable(dir: &Path) -> Result<(), PipelineError> {
    let refuse = |detail: String| {
        PipelineError::new(
            "E3006",
            format!("refusing to replace {}: {detail}", dir.display()),
        )
        .with_path(dir.display().to_string())
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            if dir.exists() && !dir.is_dir() {
                return Err(refuse("not a directory".to_string()));
            }
            return Err(create_err(dir, e));
        }
    };

    if paths::root_index_path(dir).is_file() {
        return Ok(());
    }
    for entry in entries {
        let entry = entry.map_err(|e| create_err(dir, e))?;
        let name = entry.file_name();
        let is_group_dir = entry.path().is_dir()
            && ResourceGroup::ALL.iter().any(|g| name == g.as_str());
        if !is_group_dir {
            return Err(refuse(format!(
                "not an API tree (found {})",
                name.to_string_lossy()
            )));
        }
    }
    Ok(())
}

/// Absolute form of `path` with the existing prefix canonicalized.
fn resolve(path: &Path) -> PathBuf {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut existing = abs.as_path();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return rest.iter().rev().fold(canonical, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return abs,
        }
    }
}

fn sibling(target: &Path, suffix: &str) -> Result<PathBuf, PipelineError> {
    let Some(name) = target.file_name() else {
        return Err(PipelineError::new(
            "E2101",
            format!("output root must name a directory: {}", target.display()),
        )
        .with_path(target.display().to_string()));
    };
    Ok(target.with_file_name(format!("{}.{suffix}", name.to_string_lossy())))
}

fn create_err(path: &Path, e: io::Error) -> PipelineError {
    PipelineError::new(
        "E2101",
        format!("failed to create directory {}: {e}", path.display()),
    )
    .with_path(path.display().to_string())
}

fn publish_err(path: &Path, e: io::Error) -> PipelineError {
    PipelineError::new(
        "E2104",
        format!("failed to publish {}: {e}", path.display()),
    )
    .with_path(path.display().to_string())
}
