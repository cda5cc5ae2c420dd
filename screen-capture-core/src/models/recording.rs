use serde::{Deserialize, Serialize};

/// File extension shared by scratch containers and published recordings.
pub const RECORDING_EXTENSION: &str = "ivf";

/// Opaque handle identifying one recording inside a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator(pub String);

/// A durable recording as seen through the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub locator: Locator,
    pub display_name: String,
    pub size_bytes: u64,

    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}

/// Metadata stored with a recording when it is published.
///
/// Serializable for JSON sidecar files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub display_name: String,
    pub size_bytes: u64,

    /// SHA-256 hex digest of the container bytes.
    pub checksum: String,

    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn new(display_name: &str, size_bytes: u64, checksum: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            size_bytes,
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
