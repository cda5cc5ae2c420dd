use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::models::frame::RawFrame;

/// Codec seam for platform video encoders.
///
/// Implemented by:
/// - `SimEncoderBackend` (screen-capture-sim) — null codec for development
/// - Future: MediaCodec/Media Foundation/VideoToolbox H.264 backends
///
/// The backend is driven from a dedicated encode thread owned by
/// `FrameEncoder`; implementations need `Send` but never `Sync`.
pub trait EncoderBackend: Send {
    /// FourCC identifying the produced bitstream (e.g. `b"H264"`), recorded
    /// in the scratch container header.
    fn fourcc(&self) -> [u8; 4];

    /// Validate and apply the session configuration.
    ///
    /// Fails with `CaptureError::EncoderConfig` if the platform rejects the
    /// requested dimensions, frame rate, or bitrate. Even dimensions are
    /// preferred; backends may reject odd values.
    fn configure(&mut self, config: &SessionConfig) -> Result<(), CaptureError>;

    /// Encode one raw frame in presentation order.
    ///
    /// Returns the encoded payload, which may be empty while the encoder
    /// buffers lookahead frames.
    fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>, CaptureError>;

    /// Flush any buffered data at end of stream.
    fn flush(&mut self) -> Result<Vec<u8>, CaptureError>;
}
