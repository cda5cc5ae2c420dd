use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::models::error::CaptureError;
use crate::models::recording::{Locator, Recording, RecordingMetadata, RECORDING_EXTENSION};
use crate::storage::scratch_writer::sha256_file;
use crate::traits::catalog_store::CatalogStore;

/// Moves a finished scratch container into the catalog under generated
/// metadata, off the teardown critical path.
///
/// On any failure the scratch file is left in place for manual recovery
/// rather than silently discarded; a half-created catalog entry is removed
/// best-effort.
pub struct OutputPublisher;

impl OutputPublisher {
    /// Run one publish job on a background thread.
    ///
    /// Fails with `Storage` if the thread cannot be spawned; the scratch
    /// file is untouched in that case.
    pub fn spawn_publish(
        scratch_path: PathBuf,
        catalog: Arc<dyn CatalogStore>,
    ) -> Result<thread::JoinHandle<Result<Recording, CaptureError>>, CaptureError> {
        thread::Builder::new()
            .name("output-publish".into())
            .spawn(move || {
                let result = publish(&scratch_path, catalog.as_ref());
                match &result {
                    Ok(recording) => {
                        log::info!(
                            "published {} ({} bytes)",
                            recording.display_name,
                            recording.size_bytes
                        );
                    }
                    Err(e) => {
                        log::error!(
                            "publish of {} failed: {}; scratch file left in place",
                            scratch_path.display(),
                            e
                        );
                    }
                }
                result
            })
            .map_err(|e| CaptureError::Storage(format!("failed to spawn publish thread: {}", e)))
    }
}

/// Publish one scratch file synchronously: generate a display name, insert
/// a catalog entry, stream the bytes into the catalog sink, delete the
/// scratch file.
pub fn publish(scratch_path: &Path, catalog: &dyn CatalogStore) -> Result<Recording, CaptureError> {
    let size_bytes = fs::metadata(scratch_path)
        .map_err(|e| CaptureError::ScratchRead(format!("{}: {}", scratch_path.display(), e)))?
        .len();
    let checksum = sha256_file(scratch_path)
        .map_err(|e| CaptureError::ScratchRead(format!("{}: {}", scratch_path.display(), e)))?;

    let display_name = generated_display_name();
    let metadata = RecordingMetadata::new(&display_name, size_bytes, &checksum);
    let locator = catalog.insert(&metadata)?;

    let stream_result = stream_into_catalog(scratch_path, catalog, &locator);
    if let Err(e) = stream_result {
        // Leave the scratch file; drop the half-written catalog entry.
        if let Err(cleanup) = catalog.delete(&locator) {
            log::warn!("failed to remove incomplete catalog entry: {}", cleanup);
        }
        return Err(e);
    }

    if let Err(e) = fs::remove_file(scratch_path) {
        log::warn!(
            "published recording but could not clear scratch file {}: {}",
            scratch_path.display(),
            e
        );
    }

    Ok(Recording {
        locator,
        display_name,
        size_bytes,
        created_at: metadata.created_at,
    })
}

fn stream_into_catalog(
    scratch_path: &Path,
    catalog: &dyn CatalogStore,
    locator: &Locator,
) -> Result<(), CaptureError> {
    let mut source = File::open(scratch_path)
        .map_err(|e| CaptureError::ScratchRead(format!("{}: {}", scratch_path.display(), e)))?;
    let mut sink = catalog.open_write_sink(locator)?;
    io::copy(&mut source, &mut sink)
        .map_err(|e| CaptureError::CatalogWrite(format!("streaming scratch bytes failed: {}", e)))?;
    sink.flush()
        .map_err(|e| CaptureError::CatalogWrite(format!("flushing catalog sink failed: {}", e)))?;
    Ok(())
}

/// `video_{unix_millis}.{ext}` — current time plus the fixed extension.
fn generated_display_name() -> String {
    format!(
        "video_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        RECORDING_EXTENSION
    )
}
