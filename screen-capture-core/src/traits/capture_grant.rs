/// Handler invoked when the system revokes a capture grant.
///
/// Fires at most once, on a system-driven thread.
pub type RevocationHandler = Box<dyn FnOnce() + Send + 'static>;

/// A revocable authorization token permitting screen capture.
///
/// Issued by an external permission flow and borrowed by the session
/// controller for the lifetime of exactly one session. The grant becomes
/// invalid once revoked or once the session that used it ends; it is
/// released exactly once by whichever teardown path wins.
pub trait CaptureGrant: Send {
    /// Register the handler invoked on asynchronous revocation.
    ///
    /// At most one handler is active; registering again replaces the
    /// previous one. A handler registered after revocation never fires.
    fn set_on_revoked(&mut self, handler: RevocationHandler);

    /// Release the grant, invalidating it for further capture and clearing
    /// any registered revocation handler so it can no longer fire.
    ///
    /// Idempotent.
    fn release(&mut self);
}
