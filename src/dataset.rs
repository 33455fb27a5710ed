//! Data sets saved as gzip-compressed JSON, one value per file.

use crate::error::CasicsError;
use crate::path::full_path;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, error};

pub fn dataset_from_file<T: DeserializeOwned>(file: impl AsRef<Path>) -> Result<T, CasicsError> {
    let file = full_path(file, None)?;
    debug!("reading data set from file {}", file.display());
    let read = || -> Result<T, CasicsError> {
        let decoder = GzDecoder::new(BufReader::new(File::open(&file)?));
        Ok(serde_json::from_reader(decoder)?)
    };
    read().inspect_err(|e| error!("reading data set failed for {}: {}", file.display(), e))
}

pub fn dataset_to_file<T: Serialize + ?Sized>(
    file: impl AsRef<Path>,
    data_set: &T,
) -> Result<(), CasicsError> {
    let file = full_path(file, None)?;
    debug!("saving data set to file {}", file.display());
    let write = || -> Result<(), CasicsError> {
        let mut encoder =
            GzEncoder::new(BufWriter::new(File::create(&file)?), Compression::default());
        serde_json::to_writer(&mut encoder, data_set)?;
        encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
        Ok(())
    };
    write().inspect_err(|e| {
        error!(
            "encountered error trying to save data set {}: {}",
            file.display(),
            e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Read;

    #[test]
    fn writes_gzip_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ids.json.gz");
        let data: HashMap<String, Vec<i64>> =
            HashMap::from([("Python".to_string(), vec![1, 2, 3])]);

        dataset_to_file(&path, &data).expect("save data set");

        let mut magic = [0u8; 2];
        File::open(&path).unwrap().read_exact(&mut magic).unwrap();
        assert_eq!(magic, [0x1f, 0x8b]);

        let back: HashMap<String, Vec<i64>> = dataset_from_file(&path).expect("load data set");
        assert_eq!(back, data);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = dataset_from_file::<Vec<i64>>(dir.path().join("nope.gz")).unwrap_err();
        assert!(matches!(err, CasicsError::Io(_)));
    }
}
