//! # screen-capture-sim
//!
//! In-process simulated backend for screen-capture-core.
//!
//! Provides:
//! - `SimProjection` / `SimGrant` — revocable capture grants whose
//!   revocation can be triggered programmatically, standing in for the
//!   system permission flow
//! - `SimEncoderBackend` — null codec that passes raw frames through
//! - `SimDisplay` — fixed display geometry
//! - `FramePump` — synthetic frame producer driving a `CaptureSurface`
//!
//! Useful for development and for exercising the full session lifecycle
//! (including externally triggered stops) without any OS capture APIs. A
//! real platform backend implements the same two traits.
//!
//! ## Usage
//! ```ignore
//! use screen_capture_core::{FsCatalog, SessionConfig, SessionController};
//! use screen_capture_sim::{SimDisplay, SimEncoderBackend, SimProjection};
//!
//! let display = SimDisplay::default();
//! let (width, height) = display.bounds();
//! let config = SessionConfig::for_display(width, height, scratch_dir);
//! let (grant, handle) = SimProjection::request_grant();
//! controller.start(config, Box::new(grant), Box::new(SimEncoderBackend::new()))?;
//! ```

pub mod display;
pub mod encoder;
pub mod frame_pump;
pub mod grant;

pub use display::SimDisplay;
pub use encoder::SimEncoderBackend;
pub use frame_pump::FramePump;
pub use grant::{SimGrant, SimGrantHandle, SimProjection};
