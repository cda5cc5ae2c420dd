//! IVF container format utilities.
//!
//! Generates the standard 32-byte IVF header and per-frame record headers,
//! and provides helpers for patching header fields after a session completes.

/// Size of the IVF file header in bytes.
pub const IVF_HEADER_SIZE: usize = 32;

/// Size of the per-frame record header in bytes.
pub const IVF_FRAME_HEADER_SIZE: usize = 12;

/// Byte offset of the frame-count field inside the file header.
pub const IVF_FRAME_COUNT_OFFSET: u64 = 24;

/// Generate a 32-byte IVF header.
///
/// Layout (all integers little-endian):
/// ```text
/// [0-3]    "DKIF"
/// [4-5]    version (0)
/// [6-7]    header size (32)
/// [8-11]   codec FourCC
/// [12-13]  width in pixels
/// [14-15]  height in pixels
/// [16-19]  timebase denominator (frame rate)
/// [20-23]  timebase numerator (1)
/// [24-27]  frame count (placeholder: patched on close)
/// [28-31]  unused
/// ```
pub fn generate_ivf_header(
    fourcc: [u8; 4],
    width: u16,
    height: u16,
    frame_rate: u32,
    frame_count: u32,
) -> [u8; IVF_HEADER_SIZE] {
    let mut header = [0u8; IVF_HEADER_SIZE];

    header[0..4].copy_from_slice(b"DKIF");
    header[4..6].copy_from_slice(&0u16.to_le_bytes());
    header[6..8].copy_from_slice(&(IVF_HEADER_SIZE as u16).to_le_bytes());
    header[8..12].copy_from_slice(&fourcc);
    header[12..14].copy_from_slice(&width.to_le_bytes());
    header[14..16].copy_from_slice(&height.to_le_bytes());
    header[16..20].copy_from_slice(&frame_rate.to_le_bytes());
    header[20..24].copy_from_slice(&1u32.to_le_bytes());
    header[24..28].copy_from_slice(&frame_count.to_le_bytes());

    header
}

/// Generate a per-frame record header: payload size then presentation
/// timestamp in timebase units.
///
/// ```text
/// [0-3]    payload size
/// [4-11]   pts
/// ```
pub fn generate_frame_header(payload_size: u32, pts: u64) -> [u8; IVF_FRAME_HEADER_SIZE] {
    let mut header = [0u8; IVF_FRAME_HEADER_SIZE];
    header[0..4].copy_from_slice(&payload_size.to_le_bytes());
    header[4..12].copy_from_slice(&pts.to_le_bytes());
    header
}

/// Patch the frame-count field at offset 24.
pub fn patch_frame_count(header: &mut [u8], frame_count: u64) {
    let count = frame_count as u32;
    header[24..28].copy_from_slice(&count.to_le_bytes());
}
