use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct Versioned {
    running: bool,
    seq: u64,
}

struct Shared {
    value: Mutex<Versioned>,
    changed: Condvar,
}

/// Process-wide observable "is a capture running" flag.
///
/// Mutations funnel exclusively through the session controller at the
/// Starting-entry and Idle-entry transitions; everything else holds a
/// read-only view. Any number of watchers may subscribe. Each watcher
/// observes transitions in the order they occurred and never reads a stale
/// value, though intermediate values can be missed while not watching.
#[derive(Clone)]
pub struct RunningState {
    shared: Arc<Shared>,
}

impl RunningState {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                value: Mutex::new(Versioned { running: false, seq: 0 }),
                changed: Condvar::new(),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.shared.value.lock().running
    }

    /// Flip the flag, waking all watchers. Controller-only.
    pub(crate) fn set(&self, running: bool) {
        let mut value = self.shared.value.lock();
        if value.running != running {
            value.running = running;
            value.seq += 1;
            self.shared.changed.notify_all();
        }
    }

    pub fn subscribe(&self) -> RunningWatcher {
        RunningWatcher {
            shared: Arc::clone(&self.shared),
            last_seq: 0,
        }
    }
}

impl Default for RunningState {
    fn default() -> Self {
        Self::new()
    }
}

/// One observer's view of a [`RunningState`].
pub struct RunningWatcher {
    shared: Arc<Shared>,
    last_seq: u64,
}

impl RunningWatcher {
    /// Latest value, never stale.
    pub fn current(&mut self) -> bool {
        let value = self.shared.value.lock();
        self.last_seq = value.seq;
        value.running
    }

    /// True if the flag has transitioned since this watcher last looked.
    pub fn has_changed(&self) -> bool {
        self.shared.value.lock().seq != self.last_seq
    }

    /// Block until the flag equals `target` or the timeout elapses.
    ///
    /// Returns whether the target value was observed.
    pub fn wait_for(&mut self, target: bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut value = self.shared.value.lock();
        loop {
            if value.running == target {
                self.last_seq = value.seq;
                return true;
            }
            if self.shared.changed.wait_until(&mut value, deadline).timed_out() {
                self.last_seq = value.seq;
                return value.running == target;
            }
        }
    }
}
