use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording::{Locator, Recording, RecordingMetadata, RECORDING_EXTENSION};
use crate::traits::catalog_store::CatalogStore;

/// Directory-backed [`CatalogStore`].
///
/// Each recording is a container file named by its locator plus a JSON
/// metadata sidecar:
///
/// ```text
/// {root}/{id}.ivf
/// {root}/{id}.metadata.json
/// ```
///
/// Stands in for a system media index on platforms without one; also the
/// backing store for the browse/rename/delete feature.
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, locator: &Locator) -> PathBuf {
        self.root.join(format!("{}.{}", locator.0, RECORDING_EXTENSION))
    }

    fn sidecar_path(&self, locator: &Locator) -> PathBuf {
        self.root.join(format!("{}.metadata.json", locator.0))
    }

    fn read_sidecar(&self, locator: &Locator) -> Result<RecordingMetadata, CaptureError> {
        let json = fs::read_to_string(self.sidecar_path(locator))
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to read metadata: {}", e)))?;
        serde_json::from_str(&json)
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to parse metadata: {}", e)))
    }

    fn write_sidecar(
        &self,
        locator: &Locator,
        metadata: &RecordingMetadata,
    ) -> Result<(), CaptureError> {
        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to serialize metadata: {}", e)))?;
        fs::write(self.sidecar_path(locator), json)
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to write metadata: {}", e)))
    }
}

impl CatalogStore for FsCatalog {
    fn insert(&self, metadata: &RecordingMetadata) -> Result<Locator, CaptureError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to create catalog root: {}", e)))?;

        let locator = Locator(metadata.id.clone());
        self.write_sidecar(&locator, metadata)?;
        Ok(locator)
    }

    fn open_write_sink(&self, locator: &Locator) -> Result<Box<dyn Write + Send>, CaptureError> {
        let file = File::create(self.data_path(locator))
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to create entry file: {}", e)))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn query(&self) -> Result<Vec<Recording>, CaptureError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            // An untouched catalog is empty, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CaptureError::CatalogWrite(format!(
                    "failed to read catalog root: {}",
                    e
                )))
            }
        };

        let mut recordings = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| CaptureError::CatalogWrite(format!("failed to list entry: {}", e)))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(id) = name.strip_suffix(".metadata.json") else {
                continue;
            };

            let locator = Locator(id.to_string());
            let metadata = match self.read_sidecar(&locator) {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("skipping unreadable catalog entry {}: {}", id, e);
                    continue;
                }
            };

            // The backing file is authoritative for size.
            let size_bytes = fs::metadata(self.data_path(&locator))
                .map(|m| m.len())
                .unwrap_or(metadata.size_bytes);

            recordings.push(Recording {
                locator,
                display_name: metadata.display_name,
                size_bytes,
                created_at: metadata.created_at,
            });
        }

        // Newest first; RFC 3339 UTC timestamps order lexicographically.
        recordings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recordings)
    }

    fn delete(&self, locator: &Locator) -> Result<(), CaptureError> {
        fs::remove_file(self.data_path(locator))
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to delete entry: {}", e)))?;
        fs::remove_file(self.sidecar_path(locator))
            .map_err(|e| CaptureError::CatalogWrite(format!("failed to delete metadata: {}", e)))?;
        Ok(())
    }

    fn rename(&self, locator: &Locator, new_name: &str) -> Result<(), CaptureError> {
        let mut metadata = self.read_sidecar(locator)?;
        metadata.display_name = new_name.to_string();
        self.write_sidecar(locator, &metadata)
    }
}
