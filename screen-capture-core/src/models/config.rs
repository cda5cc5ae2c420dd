use std::path::{Path, PathBuf};

use super::recording::RECORDING_EXTENSION;

/// Fraction of the display bounds a capture session records at.
pub const DISPLAY_SCALE_FACTOR: f32 = 0.8;

/// Default encode frame rate in frames per second.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Default encode bitrate in bits per second (512 kbit/s).
pub const DEFAULT_BITRATE_BPS: u32 = 512_000;

/// Configuration for one capture session.
///
/// Immutable for the session's lifetime. Normally derived once from the
/// current display geometry via [`SessionConfig::for_display`], which also
/// allocates a scratch path unique to this session so a new session can
/// never contend with a still-publishing predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capture width in pixels.
    pub width: u32,

    /// Capture height in pixels.
    pub height: u32,

    /// Encode frame rate in frames per second.
    pub frame_rate: u32,

    /// Encode bitrate in bits per second.
    pub bitrate_bps: u32,

    /// Scratch container file for the in-progress encoded output.
    pub scratch_path: PathBuf,
}

impl SessionConfig {
    /// Derive a config from the display bounds, scaled by
    /// [`DISPLAY_SCALE_FACTOR`] preserving aspect ratio, with default frame
    /// rate and bitrate and a fresh per-session scratch path under
    /// `scratch_dir`.
    pub fn for_display(display_width: u32, display_height: u32, scratch_dir: &Path) -> Self {
        let (width, height) =
            scaled_dimensions(display_width, display_height, DISPLAY_SCALE_FACTOR);
        Self {
            width,
            height,
            frame_rate: DEFAULT_FRAME_RATE,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            scratch_path: scratch_dir.join(format!(
                "capture_{}.{}",
                uuid::Uuid::new_v4(),
                RECORDING_EXTENSION
            )),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid dimensions: {}x{}", self.width, self.height));
        }
        if self.frame_rate == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.bitrate_bps == 0 {
            return Err("bitrate must be positive".into());
        }
        Ok(())
    }
}

/// Scale display bounds by `factor`, preserving aspect ratio.
///
/// Two-pass clamp: scale the width and derive the height from the aspect
/// ratio; if the derived height exceeds the scaled height bound, clamp the
/// height instead and re-derive the width. Both results are aligned down to
/// even values for codec alignment.
pub fn scaled_dimensions(max_width: u32, max_height: u32, factor: f32) -> (u32, u32) {
    let aspect = max_width as f32 / max_height as f32;

    let mut width = (max_width as f32 * factor) as u32;
    let mut height = (width as f32 / aspect) as u32;

    if height > (max_height as f32 * factor) as u32 {
        height = (max_height as f32 * factor) as u32;
        width = (height as f32 * aspect) as u32;
    }

    (width & !1, height & !1)
}
