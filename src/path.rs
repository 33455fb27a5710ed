use crate::error::CasicsError;
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_PATH_ID: i64 = 99_999_999;

/// Id-based storage path `root/nn/nn/nn/nn`.
///
/// The id is zero-padded to eight digits and split in pairs, so repository
/// 7182480 lands in `root/07/18/24/80`.
pub fn generate_path(root: impl AsRef<Path>, repo_id: i64) -> Result<PathBuf, CasicsError> {
    if !(0..=MAX_PATH_ID).contains(&repo_id) {
        return Err(CasicsError::InvalidRepoId(repo_id));
    }
    let s = format!("{repo_id:08}");
    Ok(root
        .as_ref()
        .join(&s[0..2])
        .join(&s[2..4])
        .join(&s[4..6])
        .join(&s[6..8]))
}

/// Resolve `filename` against an absolute `subdir`, or else against the
/// current directory (and a relative `subdir`, if given).
pub fn full_path(filename: impl AsRef<Path>, subdir: Option<&Path>) -> Result<PathBuf, CasicsError> {
    let filename = filename.as_ref();
    match subdir {
        Some(dir) if dir.is_absolute() => Ok(dir.join(filename)),
        Some(dir) => Ok(std::env::current_dir()?.join(dir).join(filename)),
        None => Ok(std::env::current_dir()?.join(filename)),
    }
}

/// Restores the working directory it was created in when dropped.
pub struct CwdGuard {
    saved: PathBuf,
}

impl CwdGuard {
    pub fn new() -> Result<Self, CasicsError> {
        Ok(Self {
            saved: std::env::current_dir()?,
        })
    }

    pub fn saved(&self) -> &Path {
        &self.saved
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.saved) {
            warn!(path = %self.saved.display(), error = %e, "failed to restore working directory");
        }
    }
}
