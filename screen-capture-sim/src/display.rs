/// Fixed display geometry for the simulated backend.
///
/// Defaults to a 1080x2400 portrait panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimDisplay {
    pub width: u32,
    pub height: u32,
}

impl SimDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Maximum window bounds, the input to capture-dimension scaling.
    pub fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for SimDisplay {
    fn default() -> Self {
        Self { width: 1080, height: 2400 }
    }
}
