//! Values cached as JSON files next to the directory they describe.
//!
//! The cache for `/work/repos` lives in `/work/repos.casics_cache/`.

use crate::error::CasicsError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::error;

pub const CACHE_SUFFIX: &str = ".casics_cache";

pub fn cache_dir(orig_dir: impl AsRef<Path>) -> PathBuf {
    let orig = orig_dir.as_ref().to_string_lossy();
    let trimmed = orig.strip_suffix('/').unwrap_or(&orig);
    PathBuf::from(format!("{trimmed}{CACHE_SUFFIX}"))
}

pub fn cache_file(orig_dir: impl AsRef<Path>, cache_name: &str) -> PathBuf {
    cache_dir(orig_dir).join(format!("{cache_name}.json"))
}

pub fn save_cached_value<T: Serialize + ?Sized>(
    orig_dir: impl AsRef<Path>,
    cache_name: &str,
    value: &T,
) -> Result<PathBuf, CasicsError> {
    let dest_dir = cache_dir(&orig_dir);
    let dest_file = cache_file(&orig_dir, cache_name);
    write_json(&dest_dir, &dest_file, value)
        .inspect_err(|e| {
            error!(
                "encountered error trying to write cache {}: {}",
                dest_file.display(),
                e
            );
        })
        .map(|()| dest_file)
}

fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    file: &Path,
    value: &T,
) -> Result<(), CasicsError> {
    fs::create_dir_all(dir)?;
    let mut out = BufWriter::new(File::create(file)?);
    serde_json::to_writer(&mut out, value)?;
    out.flush()?;
    Ok(())
}

/// The cached value, or `None` if there is no cache or it cannot be read.
pub fn cached_value<T: DeserializeOwned>(orig_dir: impl AsRef<Path>, cache_name: &str) -> Option<T> {
    let cache = cache_file(orig_dir, cache_name);
    if !cache.exists() {
        return None;
    }
    let read = || -> Result<T, CasicsError> {
        let reader = BufReader::new(File::open(&cache)?);
        Ok(serde_json::from_reader(reader)?)
    };
    read()
        .inspect_err(|e| {
            error!("cache exists but reading failed for {}: {}", cache.display(), e);
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn cache_paths_strip_trailing_slash() {
        assert_eq!(
            cache_dir("/work/repos/"),
            PathBuf::from("/work/repos.casics_cache")
        );
        assert_eq!(
            cache_file("/work/repos", "ids"),
            PathBuf::from("/work/repos.casics_cache/ids.json")
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orig = dir.path().join("repos");
        let value = BTreeMap::from([("mhucka/libsbml".to_string(), 16335_i64)]);

        let written = save_cached_value(&orig, "ids", &value).expect("save cache");
        assert_eq!(written, cache_file(&orig, "ids"));

        let loaded: Option<BTreeMap<String, i64>> = cached_value(&orig, "ids");
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn missing_or_corrupt_cache_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orig = dir.path().join("repos");
        assert_eq!(cached_value::<Vec<i64>>(&orig, "absent"), None);

        fs::create_dir_all(cache_dir(&orig)).unwrap();
        fs::write(cache_file(&orig, "broken"), b"{not json").unwrap();
        assert_eq!(cached_value::<Vec<i64>>(&orig, "broken"), None);
    }
}
