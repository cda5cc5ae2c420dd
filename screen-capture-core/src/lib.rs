//! # screen-capture-core
//!
//! Platform-agnostic screen capture core library.
//!
//! Owns the capture-session lifecycle: acquiring a revocable capture grant,
//! wiring it into a frame → encoded-container pipeline, tracking a single
//! authoritative running/idle state, and guaranteeing deterministic resource
//! release and output publication even when the capture is terminated
//! externally. Platform backends implement the `CaptureGrant` and
//! `EncoderBackend` traits and plug into the generic `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! screen-capture-core (this crate)
//! ├── traits/       ← CaptureGrant, EncoderBackend, CatalogStore
//! ├── models/       ← CaptureError, SessionState, SessionConfig, Recording, RawFrame
//! ├── processing/   ← FrameEncoder, CaptureSurface, IVF container layout
//! ├── session/      ← SessionController (state machine), RunningState broadcast
//! └── storage/      ← ScratchWriter, OutputPublisher, FsCatalog
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{
    SessionConfig, DEFAULT_BITRATE_BPS, DEFAULT_FRAME_RATE, DISPLAY_SCALE_FACTOR,
};
pub use models::error::CaptureError;
pub use models::frame::RawFrame;
pub use models::recording::{Locator, Recording, RecordingMetadata, RECORDING_EXTENSION};
pub use models::state::SessionState;
pub use processing::frame_encoder::{CaptureSurface, EncodeSummary, FrameEncoder};
pub use session::controller::SessionController;
pub use session::running_state::{RunningState, RunningWatcher};
pub use storage::fs_catalog::FsCatalog;
pub use storage::publisher::OutputPublisher;
pub use storage::scratch_writer::ScratchWriter;
pub use traits::capture_grant::{CaptureGrant, RevocationHandler};
pub use traits::catalog_store::CatalogStore;
pub use traits::encoder_backend::EncoderBackend;
