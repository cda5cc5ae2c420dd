use std::io::Write;

use crate::models::error::CaptureError;
use crate::models::recording::{Locator, Recording, RecordingMetadata};

/// The external media index holding durable recordings.
///
/// The publish path uses `insert` + `open_write_sink`; the browse feature
/// uses `query`/`rename`/`delete`. The capture core never mutates catalog
/// entries outside these calls.
pub trait CatalogStore: Send + Sync {
    /// Create a new catalog entry, returning its locator.
    ///
    /// Fails with `CaptureError::CatalogWrite` if the catalog rejects the
    /// insert (e.g. storage full).
    fn insert(&self, metadata: &RecordingMetadata) -> Result<Locator, CaptureError>;

    /// Open a byte sink that stores into the entry's backing bytes.
    fn open_write_sink(&self, locator: &Locator) -> Result<Box<dyn Write + Send>, CaptureError>;

    /// All recordings, newest first.
    fn query(&self) -> Result<Vec<Recording>, CaptureError>;

    /// Remove an entry and its backing bytes.
    fn delete(&self, locator: &Locator) -> Result<(), CaptureError>;

    /// Change an entry's display name.
    fn rename(&self, locator: &Locator, new_name: &str) -> Result<(), CaptureError>;
}
