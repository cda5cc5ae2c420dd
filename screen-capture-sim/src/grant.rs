use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use screen_capture_core::{CaptureGrant, RevocationHandler};

struct GrantShared {
    handler: Mutex<Option<RevocationHandler>>,
    released: AtomicBool,
    revoked: AtomicBool,
    release_calls: AtomicUsize,
}

/// Issues simulated capture grants, standing in for the platform's
/// permission/consent flow.
pub struct SimProjection;

impl SimProjection {
    /// Issue a fresh grant plus the system-side handle that can revoke it.
    pub fn request_grant() -> (SimGrant, SimGrantHandle) {
        let shared = Arc::new(GrantShared {
            handler: Mutex::new(None),
            released: AtomicBool::new(false),
            revoked: AtomicBool::new(false),
            release_calls: AtomicUsize::new(0),
        });
        (
            SimGrant { shared: Arc::clone(&shared) },
            SimGrantHandle { shared },
        )
    }
}

/// A simulated revocable capture grant.
pub struct SimGrant {
    shared: Arc<GrantShared>,
}

impl CaptureGrant for SimGrant {
    fn set_on_revoked(&mut self, handler: RevocationHandler) {
        if self.shared.revoked.load(Ordering::SeqCst) || self.shared.released.load(Ordering::SeqCst)
        {
            // A dead grant never fires a late-registered handler.
            return;
        }
        *self.shared.handler.lock() = Some(handler);
    }

    fn release(&mut self) {
        self.shared.release_calls.fetch_add(1, Ordering::SeqCst);
        self.shared.released.store(true, Ordering::SeqCst);
        self.shared.handler.lock().take();
    }
}

/// System-side view of a [`SimGrant`]: revokes it and inspects its fate.
#[derive(Clone)]
pub struct SimGrantHandle {
    shared: Arc<GrantShared>,
}

impl SimGrantHandle {
    /// Revoke the grant, invoking the registered handler on the calling
    /// thread. Subsequent revokes are no-ops.
    pub fn revoke(&self) {
        if self.shared.revoked.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("revoking simulated capture grant");
        // Take the handler outside the lock so the callback may release the
        // grant without deadlocking.
        let handler = self.shared.handler.lock().take();
        if let Some(handler) = handler {
            handler();
        }
    }

    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::SeqCst)
    }

    /// Number of times `release` was called; a correct teardown calls it
    /// exactly once per session.
    pub fn release_calls(&self) -> usize {
        self.shared.release_calls.load(Ordering::SeqCst)
    }
}
