// reflekt-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use fs_extra::dir::CopyOptions;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Write content to a file atomically using a temporary file.
///
/// The temporary file is created next to the target so the final rename never
/// crosses filesystems. Missing parent directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = parent_or_cwd(path);
    fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;
    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

fn parent_or_cwd(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Relative, no `..`: the path stays inside the directory it is joined to.
fn ensure_contained(rel: &Path) -> Result<(), InfrastructureError> {
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(InfrastructureError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unsafe path {:?} escapes the package directory", rel),
        )));
    }
    Ok(())
}

// --- PACKAGE STAGING ---

/// Scratch copy of a package directory. Everything is written here and the
/// destination is only replaced by `commit`. Dropped without commit, the
/// staging directory is removed and the destination is left untouched.
#[derive(Debug)]
pub struct PackageStaging {
    dest: PathBuf,
    staging: PathBuf,
    committed: bool,
}

impl PackageStaging {
    /// Seeds the staging area from the existing package, else from `template`,
    /// else starts empty.
    pub fn prepare(dest: &Path, template: Option<&Path>) -> Result<Self, InfrastructureError> {
        let name = dest
            .file_name()
            .ok_or_else(|| {
                InfrastructureError::ConfigError(format!("Invalid package directory {:?}", dest))
            })?
            .to_string_lossy()
            .to_string();
        let parent = parent_or_cwd(dest);
        fs::create_dir_all(parent)?;

        let staging = parent.join(format!(".{}.staging", name));
        if staging.exists() {
            debug!(path = ?staging, "Removing leftover staging directory");
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let seed = if dest.is_dir() {
            Some(dest)
        } else {
            template.filter(|t| t.is_dir())
        };

        let mut options = CopyOptions::new();
        options.content_only = true;
        options.overwrite = true;

        let this = Self {
            dest: dest.to_path_buf(),
            staging,
            committed: false,
        };
        if let Some(seed) = seed {
            info!(from = ?seed, "Seeding package staging area");
            fs_extra::dir::copy(seed, &this.staging, &options)?;
        }
        Ok(this)
    }

    /// Removes `rel` (a directory of generated files) from the staging area.
    pub fn clear_dir(&self, rel: &Path) -> Result<(), InfrastructureError> {
        ensure_contained(rel)?;
        let target = self.staging.join(rel);
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        }
        Ok(())
    }

    pub fn write(&self, rel: &Path, content: &str) -> Result<(), InfrastructureError> {
        ensure_contained(rel)?;
        atomic_write(self.staging.join(rel), content)
    }

    /// Swaps the staging area into place.
    pub fn commit(mut self) -> Result<PathBuf, InfrastructureError> {
        let name = self
            .dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let backup = parent_or_cwd(&self.dest).join(format!(".{}.previous", name));
        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }

        let had_previous = self.dest.exists();
        if had_previous {
            fs::rename(&self.dest, &backup)?;
        }

        if let Err(e) = fs::rename(&self.staging, &self.dest) {
            if had_previous {
                return Err(restore_previous(&backup, &self.dest, e));
            }
            return Err(InfrastructureError::Io(e));
        }
        self.committed = true;

        if had_previous {
            fs::remove_dir_all(&backup)?;
        }
        info!(path = ?self.dest, "Package written");
        Ok(self.dest.clone())
    }
}

/// Moves `backup` back to `dest` after a failed swap. The returned error
/// carries both failures when the old package cannot be put back.
fn restore_previous(backup: &Path, dest: &Path, cause: std::io::Error) -> InfrastructureError {
    match fs::rename(backup, dest) {
        Ok(()) => InfrastructureError::Io(cause),
        Err(restore) => InfrastructureError::Io(std::io::Error::new(
            cause.kind(),
            format!(
                "{} (restoring the previous package also failed: {}; it was left at {:?})",
                cause, restore, backup
            ),
        )),
    }
}

impl Drop for PackageStaging {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            let _ = fs::remove_dir_all(&self.staging);
        }
    }
}
