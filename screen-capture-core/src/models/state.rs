/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → active → stopping → idle
/// ```
///
/// No other transitions exist. `Starting` and `Stopping` exist so that
/// partial initialization and partial teardown are never externally
/// observable: outside observers see either `Idle` or "running".
///
/// The discriminants are stable because the controller stores the state in
/// an `AtomicU8` and transitions it with compare-and-exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Starting = 1,
    Active = 2,
    Stopping = 3,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// True whenever an underlying session exists, collapsing
    /// `Starting`/`Active`/`Stopping` the way external observers see them.
    pub fn is_running(&self) -> bool {
        !self.is_idle()
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Active,
            3 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}
