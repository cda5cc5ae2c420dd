/// A raw frame delivered to the capture surface by the compositor.
///
/// Pixel data is interleaved BGRA, one byte per component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,

    /// Presentation timestamp in microseconds since session start.
    pub pts_micros: u64,
}

impl RawFrame {
    /// Expected byte length of the pixel buffer for these dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}
