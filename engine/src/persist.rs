use crate::error::PersistError;
use crate::index::InvertedIndex;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn index(&self) -> PathBuf {
        self.root.join("index.bin")
    }

    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

/// Persist the whole immutable index as one bincode blob.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let f = BufWriter::new(File::create(paths.index())?);
    bincode::serialize_into(f, index)?;
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex, PersistError> {
    let f = BufReader::new(File::open(paths.index())?);
    let index = bincode::deserialize_from(f)?;
    Ok(index)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, PersistError> {
    let text = std::fs::read_to_string(paths.meta())?;
    let meta: MetaFile = serde_json::from_str(&text)?;
    Ok(meta)
}
