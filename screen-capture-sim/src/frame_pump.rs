use std::time::Duration;

use screen_capture_core::{CaptureError, CaptureSurface, RawFrame, SessionConfig};

/// Synthetic frame producer standing in for the compositor.
///
/// Generates BGRA frames with a per-frame fill pattern and presentation
/// timestamps spaced at the configured frame rate.
pub struct FramePump {
    width: u32,
    height: u32,
    frame_rate: u32,
}

impl FramePump {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
        }
    }

    /// Submit `count` frames as fast as possible, with pts spacing as if
    /// they had been captured in real time.
    pub fn pump_frames(&self, surface: &CaptureSurface, count: u32) -> Result<(), CaptureError> {
        for index in 0..count {
            surface.submit_frame(self.frame(index as u64))?;
        }
        Ok(())
    }

    /// Submit frames paced in real time for roughly `duration`.
    pub fn pump_for(&self, surface: &CaptureSurface, duration: Duration) -> Result<(), CaptureError> {
        let interval = Duration::from_micros(self.pts_step());
        let count = (duration.as_micros() / interval.as_micros().max(1)) as u64;
        for index in 0..count {
            surface.submit_frame(self.frame(index))?;
            std::thread::sleep(interval);
        }
        Ok(())
    }

    fn pts_step(&self) -> u64 {
        1_000_000 / self.frame_rate as u64
    }

    fn frame(&self, index: u64) -> RawFrame {
        let fill = (index % 251) as u8;
        RawFrame {
            data: vec![fill; self.width as usize * self.height as usize * 4],
            width: self.width,
            height: self.height,
            pts_micros: index * self.pts_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screen_capture_core::FrameEncoder;
    use std::path::PathBuf;

    #[test]
    fn pumped_frames_carry_spaced_timestamps() {
        let config = SessionConfig {
            width: 4,
            height: 2,
            frame_rate: 30,
            bitrate_bps: 512_000,
            scratch_path: PathBuf::from("unused.ivf"),
        };
        let pump = FramePump::new(&config);

        let first = pump.frame(0);
        let second = pump.frame(1);
        assert_eq!(first.pts_micros, 0);
        assert_eq!(second.pts_micros, 33_333);
        assert_eq!(first.data.len(), first.expected_len());
        assert_ne!(first.data[0], second.data[0]);
    }

    #[test]
    fn pump_fails_once_surface_is_detached() {
        let config = SessionConfig {
            width: 4,
            height: 2,
            frame_rate: 30,
            bitrate_bps: 512_000,
            scratch_path: std::env::temp_dir().join(format!(
                "frame_pump_test_{}_detached.ivf",
                std::process::id()
            )),
        };

        let mut encoder = FrameEncoder::new(Box::new(crate::SimEncoderBackend::new()));
        let surface = encoder.prepare(&config).unwrap();
        encoder.begin_production().unwrap();
        encoder.finalize_and_release().unwrap();

        let pump = FramePump::new(&config);
        assert!(pump.pump_frames(&surface, 1).is_err());

        std::fs::remove_file(&config.scratch_path).ok();
    }
}
