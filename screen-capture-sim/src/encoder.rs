use screen_capture_core::{CaptureError, EncoderBackend, RawFrame, SessionConfig};

/// Null codec backend: validates configuration like a picky hardware
/// encoder, then passes raw frame bytes through unchanged.
pub struct SimEncoderBackend {
    configured: Option<(u32, u32)>,
    frames_encoded: u64,
}

impl SimEncoderBackend {
    pub fn new() -> Self {
        Self { configured: None, frames_encoded: 0 }
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }
}

impl Default for SimEncoderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderBackend for SimEncoderBackend {
    fn fourcc(&self) -> [u8; 4] {
        *b"BGRA"
    }

    fn configure(&mut self, config: &SessionConfig) -> Result<(), CaptureError> {
        config.validate().map_err(CaptureError::EncoderConfig)?;
        // Hardware encoders commonly require even alignment.
        if config.width % 2 != 0 || config.height % 2 != 0 {
            return Err(CaptureError::EncoderConfig(format!(
                "odd dimensions not supported: {}x{}",
                config.width, config.height
            )));
        }
        self.configured = Some((config.width, config.height));
        Ok(())
    }

    fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>, CaptureError> {
        let Some((width, height)) = self.configured else {
            return Err(CaptureError::Encoder("backend not configured".into()));
        };
        if frame.width != width || frame.height != height {
            return Err(CaptureError::Encoder(format!(
                "frame geometry {}x{} does not match configured {}x{}",
                frame.width, frame.height, width, height
            )));
        }
        if frame.data.len() != frame.expected_len() {
            return Err(CaptureError::Encoder(format!(
                "frame buffer is {} bytes, expected {}",
                frame.data.len(),
                frame.expected_len()
            )));
        }
        self.frames_encoded += 1;
        Ok(frame.data.clone())
    }

    fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
        Ok(Vec::new())
    }
}
