use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::processing::ivf_format;

/// Streaming scratch container writer.
///
/// Appends encoded frames to an IVF container as they arrive from the
/// encode thread; the frame-count field in the header is a placeholder
/// until [`ScratchWriter::close`] patches it.
///
/// ## File layout
///
/// ```text
/// [32-byte IVF header]
/// [Frame 1: 4-byte LE size | 8-byte LE pts | payload]
/// [Frame 2: ...]
/// ...
/// ```
///
/// A session stopped with zero frames still yields a valid empty-duration
/// container (header only, frame count 0).
pub struct ScratchWriter {
    path: PathBuf,
    file: Option<File>,
    frames_written: u64,
    total_bytes_written: u64,
    is_open: bool,
}

impl ScratchWriter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            frames_written: 0,
            total_bytes_written: 0,
            is_open: false,
        }
    }

    /// Create the file and write the initial header with a zero frame count.
    pub fn open(&mut self, fourcc: [u8; 4], config: &SessionConfig) -> Result<(), CaptureError> {
        if self.is_open {
            return Ok(());
        }

        let width = u16::try_from(config.width)
            .map_err(|_| CaptureError::Storage(format!("width {} exceeds container limit", config.width)))?;
        let height = u16::try_from(config.height)
            .map_err(|_| CaptureError::Storage(format!("height {} exceeds container limit", config.height)))?;

        // Ensure the scratch directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::Storage(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&self.path)
            .map_err(|e| CaptureError::Storage(format!("failed to create file: {}", e)))?;
        self.file = Some(file);

        let header = ivf_format::generate_ivf_header(fourcc, width, height, config.frame_rate, 0);
        self.write_raw(&header)?;
        self.is_open = true;
        Ok(())
    }

    /// Append one encoded frame record in presentation order.
    pub fn write_frame(&mut self, payload: &[u8], pts: u64) -> Result<(), CaptureError> {
        if !self.is_open {
            return Err(CaptureError::Storage("file is not open for writing".into()));
        }

        let header = ivf_format::generate_frame_header(payload.len() as u32, pts);
        self.write_raw(&header)?;
        self.write_raw(payload)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Finalize the container: patch the frame count, flush, and compute
    /// the SHA-256 checksum of the completed file.
    pub fn close(&mut self) -> Result<String, CaptureError> {
        if !self.is_open {
            return Err(CaptureError::Storage("file is not open".into()));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Storage("file is not open".into()))?;

        file.seek(SeekFrom::Start(ivf_format::IVF_FRAME_COUNT_OFFSET))
            .map_err(|e| CaptureError::Storage(e.to_string()))?;
        let frame_count = self.frames_written as u32;
        file.write_all(&frame_count.to_le_bytes())
            .map_err(|e| CaptureError::Storage(e.to_string()))?;

        file.flush()
            .map_err(|e| CaptureError::Storage(e.to_string()))?;
        self.file = None;
        self.is_open = false;

        let checksum = sha256_file(&self.path)
            .map_err(|e| CaptureError::Storage(format!("failed to checksum file: {}", e)))?;
        Ok(checksum)
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Total bytes written so far (including the header).
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Path of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Storage("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::Storage(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

/// Compute the SHA-256 hex digest of a file.
pub(crate) fn sha256_file(path: &Path) -> std::io::Result<String> {
    let data = fs::read(path)?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scratch_writer_test_{}_{}", std::process::id(), name))
    }

    fn test_config(path: PathBuf) -> SessionConfig {
        SessionConfig {
            width: 864,
            height: 1920,
            frame_rate: 30,
            bitrate_bps: 512_000,
            scratch_path: path,
        }
    }

    #[test]
    fn writes_frames_and_patches_count_on_close() {
        let path = temp_path("frames.ivf");
        let config = test_config(path.clone());

        let mut writer = ScratchWriter::new(path.clone());
        writer.open(*b"H264", &config).unwrap();
        writer.write_frame(&[0x11; 100], 0).unwrap();
        writer.write_frame(&[0x22; 60], 1).unwrap();

        assert_eq!(writer.frames_written(), 2);
        let checksum = writer.close().unwrap();
        assert_eq!(checksum.len(), 64);

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 32 + (12 + 100) + (12 + 60));
        assert_eq!(&data[0..4], b"DKIF");

        let count = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
        assert_eq!(count, 2);

        // First frame record: size then pts
        let size = u32::from_le_bytes([data[32], data[33], data[34], data[35]]);
        assert_eq!(size, 100);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn zero_frame_close_yields_valid_empty_container() {
        let path = temp_path("empty.ivf");
        let config = test_config(path.clone());

        let mut writer = ScratchWriter::new(path.clone());
        writer.open(*b"H264", &config).unwrap();
        writer.close().unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 32);
        assert_eq!(&data[0..4], b"DKIF");
        let count = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
        assert_eq!(count, 0);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn write_after_close_is_rejected() {
        let path = temp_path("closed.ivf");
        let config = test_config(path.clone());

        let mut writer = ScratchWriter::new(path.clone());
        writer.open(*b"H264", &config).unwrap();
        writer.close().unwrap();

        assert!(matches!(
            writer.write_frame(&[0u8; 4], 0),
            Err(CaptureError::Storage(_))
        ));
        assert!(matches!(writer.close(), Err(CaptureError::Storage(_))));

        fs::remove_file(&path).ok();
    }
}
