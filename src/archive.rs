//! Archive assembly.
//!
//! All derivatives of one run are packed into a single ZIP held in memory.
//! Entries keep the order the targets were given in and are DEFLATE
//! compressed. Timestamps are pinned to the ZIP epoch (1980-01-01) so the
//! same input always yields byte-identical archives.

use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),
}

/// One encoded derivative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    /// File name inside the archive.
    pub name: String,
    /// Target label as given, before sanitizing.
    pub label: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportEntry {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Finished output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Archive {
    /// Suggested file name, `{base}_resized.zip`.
    pub file_name: String,
    pub entries: Vec<ExportEntry>,
    /// The serialized ZIP.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Archive {
    /// Pack `entries` into a ZIP, in order.
    pub fn assemble(file_name: String, entries: Vec<ExportEntry>) -> Result<Self, ArchiveError> {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &entries {
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.bytes)?;
        }
        let bytes = zip.finish()?.into_inner();

        Ok(Self {
            file_name,
            entries,
            bytes,
        })
    }

    /// Write the ZIP into `dir` under its suggested name.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ArchiveError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// Write every entry into `dir` as a separate file instead of the ZIP.
    pub fn write_entries(&self, dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
        std::fs::create_dir_all(dir)?;
        self.entries
            .iter()
            .map(|entry| -> Result<PathBuf, ArchiveError> {
                let path = dir.join(&entry.name);
                std::fs::write(&path, &entry.bytes)?;
                Ok(path)
            })
            .collect()
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}
