use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::models::frame::RawFrame;
use crate::storage::scratch_writer::ScratchWriter;
use crate::traits::encoder_backend::EncoderBackend;

/// How often the encode thread re-checks its shutdown flag while idle.
const ENCODE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Summary returned when the encode pipeline is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub scratch_path: PathBuf,
    pub frames: u64,
    pub bytes_written: u64,

    /// SHA-256 hex digest of the finished scratch container.
    pub checksum: String,
}

/// Drawable surface handle returned by [`FrameEncoder::prepare`].
///
/// The compositor (or a frame pump in tests) submits raw frames here; the
/// encode thread drains them in presentation order. Clones all feed the
/// same session.
#[derive(Clone)]
pub struct CaptureSurface {
    sender: mpsc::Sender<RawFrame>,
    width: u32,
    height: u32,
}

impl CaptureSurface {
    /// Deliver one frame to the encode pipeline.
    ///
    /// Fails once the session's encoder has been finalized.
    pub fn submit_frame(&self, frame: RawFrame) -> Result<(), CaptureError> {
        self.sender
            .send(frame)
            .map_err(|_| CaptureError::Encoder("capture surface is detached".into()))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Drives a codec backend, consuming surface frames and producing an
/// encoded byte stream appended to the session's scratch container.
///
/// Data flow:
/// ```text
/// [CaptureSurface] → [frame channel] → [encode thread: EncoderBackend] → [ScratchWriter]
/// ```
///
/// Mutates only the scratch file and its own handles; never touches the
/// catalog.
pub struct FrameEncoder {
    backend: Option<Box<dyn EncoderBackend>>,
    writer: Arc<Mutex<Option<ScratchWriter>>>,
    scratch_path: Option<PathBuf>,
    frame_rate: u32,
    frame_rx: Option<mpsc::Receiver<RawFrame>>,
    running: Arc<AtomicBool>,
    encode_error: Arc<Mutex<Option<CaptureError>>>,
    encode_handle: Option<thread::JoinHandle<()>>,
    prepared: bool,
    finalized: bool,
    summary: Option<EncodeSummary>,
}

impl FrameEncoder {
    pub fn new(backend: Box<dyn EncoderBackend>) -> Self {
        Self {
            backend: Some(backend),
            writer: Arc::new(Mutex::new(None)),
            scratch_path: None,
            frame_rate: 0,
            frame_rx: None,
            running: Arc::new(AtomicBool::new(false)),
            encode_error: Arc::new(Mutex::new(None)),
            encode_handle: None,
            prepared: false,
            finalized: false,
            summary: None,
        }
    }

    /// Validate the configuration, configure the backend, open the scratch
    /// container, and return the surface that frames are mirrored into.
    pub fn prepare(&mut self, config: &SessionConfig) -> Result<CaptureSurface, CaptureError> {
        if self.prepared {
            return Err(CaptureError::EncoderConfig("encoder is already prepared".into()));
        }

        config.validate().map_err(CaptureError::EncoderConfig)?;

        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| CaptureError::Encoder("backend already consumed".into()))?;
        backend.configure(config)?;
        let fourcc = backend.fourcc();

        let mut writer = ScratchWriter::new(config.scratch_path.clone());
        writer.open(fourcc, config)?;
        *self.writer.lock() = Some(writer);

        let (tx, rx) = mpsc::channel();
        self.frame_rx = Some(rx);
        self.scratch_path = Some(config.scratch_path.clone());
        self.frame_rate = config.frame_rate;
        self.prepared = true;

        Ok(CaptureSurface {
            sender: tx,
            width: config.width,
            height: config.height,
        })
    }

    /// Start the encode thread; from this point frames delivered to the
    /// surface are compressed and appended to the scratch file in
    /// presentation order.
    pub fn begin_production(&mut self) -> Result<(), CaptureError> {
        if !self.prepared {
            return Err(CaptureError::Encoder("encoder is not prepared".into()));
        }
        let rx = self
            .frame_rx
            .take()
            .ok_or_else(|| CaptureError::Encoder("production already started".into()))?;
        let mut backend = self
            .backend
            .take()
            .ok_or_else(|| CaptureError::Encoder("backend already consumed".into()))?;

        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let writer = Arc::clone(&self.writer);
        let encode_error = Arc::clone(&self.encode_error);
        let frame_rate = self.frame_rate;

        let handle = thread::Builder::new()
            .name("frame-encode".into())
            .spawn(move || {
                let mut last_pts = 0u64;

                loop {
                    if !running.load(Ordering::SeqCst) {
                        // Drain frames queued before the stop, then exit.
                        while let Ok(frame) = rx.try_recv() {
                            if !Self::encode_one(
                                &mut backend,
                                &writer,
                                &encode_error,
                                &frame,
                                frame_rate,
                                &mut last_pts,
                            ) {
                                return;
                            }
                        }
                        break;
                    }

                    match rx.recv_timeout(ENCODE_POLL_INTERVAL) {
                        Ok(frame) => {
                            if !Self::encode_one(
                                &mut backend,
                                &writer,
                                &encode_error,
                                &frame,
                                frame_rate,
                                &mut last_pts,
                            ) {
                                return;
                            }
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {}
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }

                // End of stream: flush whatever the codec buffered.
                match backend.flush() {
                    Ok(tail) if !tail.is_empty() => {
                        if let Some(w) = writer.lock().as_mut() {
                            if let Err(e) = w.write_frame(&tail, last_pts + 1) {
                                log::error!("failed to write flushed tail: {}", e);
                                *encode_error.lock() = Some(e);
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::error!("encoder flush failed: {}", e);
                        *encode_error.lock() = Some(e);
                    }
                }
            })
            .map_err(|e| CaptureError::Encoder(format!("failed to spawn encode thread: {}", e)))?;

        self.encode_handle = Some(handle);
        Ok(())
    }

    /// Stop accepting frames, flush pending encoded data, patch the
    /// container header, and release all encoder resources.
    ///
    /// Callable immediately after [`FrameEncoder::prepare`] with zero frames
    /// produced; the result is a valid empty-duration container. A second
    /// call is a no-op returning the original outcome — never a double
    /// release.
    pub fn finalize_and_release(&mut self) -> Result<EncodeSummary, CaptureError> {
        if self.finalized {
            return match &self.summary {
                Some(summary) => Ok(summary.clone()),
                None => Err(CaptureError::Encoder("encoder already released".into())),
            };
        }
        self.finalized = true;

        if !self.prepared {
            return Err(CaptureError::Encoder("encoder was never prepared".into()));
        }

        self.running.store(false, Ordering::SeqCst);
        // Drop an unconsumed receiver so surface submissions fail fast.
        self.frame_rx = None;

        if let Some(handle) = self.encode_handle.take() {
            // Bounded: the encode thread exits within one poll interval.
            let _ = handle.join();
        }

        let pipeline_error = self.encode_error.lock().take();

        let close_result = {
            let mut writer_guard = self.writer.lock();
            match writer_guard.take() {
                Some(mut writer) => {
                    let frames = writer.frames_written();
                    let bytes_written = writer.bytes_written();
                    writer.close().map(|checksum| EncodeSummary {
                        scratch_path: self
                            .scratch_path
                            .clone()
                            .unwrap_or_else(|| writer.path().to_path_buf()),
                        frames,
                        bytes_written,
                        checksum,
                    })
                }
                None => Err(CaptureError::Storage("scratch writer not available".into())),
            }
        };

        if let Some(error) = pipeline_error {
            // The container was still closed above so partial output stays
            // readable; report the pipeline fault to the caller.
            return Err(error);
        }

        let summary = close_result?;
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Scratch path of the session, known once prepared.
    ///
    /// Remains available after a failed finalize so teardown can still hand
    /// the partial file to recovery.
    pub fn scratch_path(&self) -> Option<&std::path::Path> {
        self.scratch_path.as_deref()
    }

    fn encode_one(
        backend: &mut Box<dyn EncoderBackend>,
        writer: &Mutex<Option<ScratchWriter>>,
        encode_error: &Mutex<Option<CaptureError>>,
        frame: &RawFrame,
        frame_rate: u32,
        last_pts: &mut u64,
    ) -> bool {
        let payload = match backend.encode(frame) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("frame encode failed: {}", e);
                *encode_error.lock() = Some(e);
                return false;
            }
        };
        if payload.is_empty() {
            return true;
        }

        // Container pts is in timebase (frame-rate) units.
        let pts = frame.pts_micros * frame_rate as u64 / 1_000_000;
        *last_pts = pts;

        if let Some(w) = writer.lock().as_mut() {
            if let Err(e) = w.write_frame(&payload, pts) {
                log::error!("failed to append encoded frame: {}", e);
                *encode_error.lock() = Some(e);
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ivf_format::IVF_HEADER_SIZE;
    use std::fs;
    use std::path::Path;

    /// Null codec: passes raw frame bytes through unchanged.
    struct PassthroughBackend {
        configured: bool,
    }

    impl PassthroughBackend {
        fn new() -> Self {
            Self { configured: false }
        }
    }

    impl EncoderBackend for PassthroughBackend {
        fn fourcc(&self) -> [u8; 4] {
            *b"RAW0"
        }

        fn configure(&mut self, config: &SessionConfig) -> Result<(), CaptureError> {
            config.validate().map_err(CaptureError::EncoderConfig)?;
            self.configured = true;
            Ok(())
        }

        fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>, CaptureError> {
            assert!(self.configured);
            Ok(frame.data.clone())
        }

        fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
            Ok(Vec::new())
        }
    }

    fn test_config(name: &str) -> SessionConfig {
        SessionConfig {
            width: 4,
            height: 2,
            frame_rate: 30,
            bitrate_bps: 512_000,
            scratch_path: std::env::temp_dir().join(format!(
                "frame_encoder_test_{}_{}",
                std::process::id(),
                name
            )),
        }
    }

    fn frame(pts_micros: u64) -> RawFrame {
        RawFrame {
            data: vec![0x5A; 4 * 2 * 4],
            width: 4,
            height: 2,
            pts_micros,
        }
    }

    fn cleanup(path: &Path) {
        fs::remove_file(path).ok();
    }

    #[test]
    fn prepare_rejects_invalid_config() {
        let mut config = test_config("invalid.ivf");
        config.width = 0;

        let mut encoder = FrameEncoder::new(Box::new(PassthroughBackend::new()));
        assert!(matches!(
            encoder.prepare(&config),
            Err(CaptureError::EncoderConfig(_))
        ));
    }

    #[test]
    fn finalize_right_after_prepare_yields_empty_container() {
        let config = test_config("instant_stop.ivf");
        let mut encoder = FrameEncoder::new(Box::new(PassthroughBackend::new()));
        let _surface = encoder.prepare(&config).unwrap();

        let summary = encoder.finalize_and_release().unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.bytes_written, IVF_HEADER_SIZE as u64);
        assert!(config.scratch_path.exists());

        cleanup(&config.scratch_path);
    }

    #[test]
    fn frames_flow_from_surface_to_scratch_file() {
        let config = test_config("flow.ivf");
        let mut encoder = FrameEncoder::new(Box::new(PassthroughBackend::new()));
        let surface = encoder.prepare(&config).unwrap();
        encoder.begin_production().unwrap();

        for i in 0..5u64 {
            surface.submit_frame(frame(i * 33_333)).unwrap();
        }

        let summary = encoder.finalize_and_release().unwrap();
        assert_eq!(summary.frames, 5);
        assert!(summary.bytes_written > IVF_HEADER_SIZE as u64);
        assert_eq!(summary.checksum.len(), 64);

        let data = fs::read(&config.scratch_path).unwrap();
        let count = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
        assert_eq!(count, 5);

        cleanup(&config.scratch_path);
    }

    #[test]
    fn finalize_twice_is_a_noop() {
        let config = test_config("double_finalize.ivf");
        let mut encoder = FrameEncoder::new(Box::new(PassthroughBackend::new()));
        let surface = encoder.prepare(&config).unwrap();
        encoder.begin_production().unwrap();
        surface.submit_frame(frame(0)).unwrap();

        let first = encoder.finalize_and_release().unwrap();
        let second = encoder.finalize_and_release().unwrap();
        assert_eq!(first, second);

        cleanup(&config.scratch_path);
    }

    #[test]
    fn submit_after_finalize_fails() {
        let config = test_config("late_submit.ivf");
        let mut encoder = FrameEncoder::new(Box::new(PassthroughBackend::new()));
        let surface = encoder.prepare(&config).unwrap();
        encoder.begin_production().unwrap();
        encoder.finalize_and_release().unwrap();

        assert!(matches!(
            surface.submit_frame(frame(0)),
            Err(CaptureError::Encoder(_))
        ));

        cleanup(&config.scratch_path);
    }
}
