use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::models::recording::Recording;
use crate::models::state::SessionState;
use crate::processing::frame_encoder::{CaptureSurface, FrameEncoder};
use crate::session::running_state::{RunningState, RunningWatcher};
use crate::storage::publisher::OutputPublisher;
use crate::traits::capture_grant::CaptureGrant;
use crate::traits::catalog_store::CatalogStore;
use crate::traits::encoder_backend::EncoderBackend;

const IDLE: u8 = SessionState::Idle as u8;
const STARTING: u8 = SessionState::Starting as u8;
const ACTIVE: u8 = SessionState::Active as u8;
const STOPPING: u8 = SessionState::Stopping as u8;

/// Resources exclusively owned by the current session, surrendered to
/// whichever teardown trigger wins the `Active → Stopping` transition.
struct SessionResources {
    encoder: FrameEncoder,
    surface: CaptureSurface,
    grant: Box<dyn CaptureGrant>,
}

struct Inner {
    /// Session state as a [`SessionState`] discriminant. All transitions go
    /// through compare-and-exchange; a plain flag check is not enough to
    /// keep an explicit stop and a grant revocation from double-releasing.
    state: AtomicU8,
    running: RunningState,
    resources: Mutex<Option<SessionResources>>,

    /// Monotonic session counter. Revocation callbacks capture the value
    /// current at registration and are ignored once it has moved on, so a
    /// callback outliving its session can never touch a successor.
    generation: AtomicU64,

    /// Generation of a session whose grant was revoked before it reached
    /// `Active` (0 = none); honored immediately after the
    /// `Starting → Active` transition.
    revoke_pending: AtomicU64,

    catalog: Arc<dyn CatalogStore>,
    publish_handles: Mutex<Vec<thread::JoinHandle<Result<Recording, CaptureError>>>>,
}

/// The capture-session lifecycle manager.
///
/// Owns at most one session at a time and the ordering of grant
/// acquisition, encoder start/stop, and teardown. The running broadcast it
/// carries is the single source of truth for "is a capture active"; it is
/// flipped only at the Starting-entry and Idle-entry transitions.
///
/// `Stop` and the grant's asynchronous revocation callback share one
/// teardown path: whichever observes `Active` first wins the
/// compare-and-transition to `Stopping` and performs the full release; the
/// other becomes a no-op. Grant, encoder, and surface are therefore
/// released exactly once no matter which trigger fires, or whether both
/// fire concurrently.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(IDLE),
                running: RunningState::new(),
                resources: Mutex::new(None),
                generation: AtomicU64::new(0),
                revoke_pending: AtomicU64::new(0),
                catalog,
                publish_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Subscribe to the process-wide running broadcast.
    pub fn subscribe_running(&self) -> RunningWatcher {
        self.inner.running.subscribe()
    }

    /// A shareable read-only view of the running broadcast.
    pub fn running_state(&self) -> RunningState {
        self.inner.running.clone()
    }

    /// Start a capture session: wire the grant's revocation callback,
    /// prepare the encoder against the config, and begin frame production.
    ///
    /// Until the session reaches `Active`, no observer can see a
    /// half-initialized session. Fails with `AlreadyRunning` when a session
    /// exists, or `EncoderConfig` when the encoder rejects the config — in
    /// which case no session is created and the grant is released.
    pub fn start(
        &self,
        config: SessionConfig,
        mut grant: Box<dyn CaptureGrant>,
        backend: Box<dyn EncoderBackend>,
    ) -> Result<(), CaptureError> {
        if self
            .inner
            .state
            .compare_exchange(IDLE, STARTING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // The rejected grant was never wired into a session; it is
            // single-use, so hand it back to the system immediately.
            grant.release();
            return Err(CaptureError::AlreadyRunning);
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.running.set(true);

        // Wire revocation before any fallible setup; a grant that dies while
        // the encoder is being prepared is latched and honored at Active.
        {
            let inner = Arc::clone(&self.inner);
            grant.set_on_revoked(Box::new(move || Self::handle_revocation(&inner, generation)));
        }

        let mut encoder = FrameEncoder::new(backend);
        let surface = match encoder.prepare(&config) {
            Ok(surface) => surface,
            Err(e) => {
                grant.release();
                self.reset_to_idle();
                return Err(e);
            }
        };

        if let Err(e) = encoder.begin_production() {
            // Partial-start cleanup: nothing was ever observable as Active.
            if let Err(cleanup) = encoder.finalize_and_release() {
                log::warn!("discarding partially prepared encoder: {}", cleanup);
            }
            grant.release();
            self.reset_to_idle();
            return Err(e);
        }

        // Resources must be in place before Active is published, so a
        // revocation that wins the race right away finds them.
        *self.inner.resources.lock() = Some(SessionResources { encoder, surface, grant });
        self.inner.state.store(ACTIVE, Ordering::SeqCst);

        if self
            .inner
            .revoke_pending
            .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // The grant died while we were starting; honor it now.
            Self::try_teardown(&self.inner);
        }

        Ok(())
    }

    /// The surface frames are mirrored into, while a session is active.
    pub fn capture_surface(&self) -> Option<CaptureSurface> {
        self.inner
            .resources
            .lock()
            .as_ref()
            .map(|r| r.surface.clone())
    }

    /// Stop the current session: halt the encoder, release the grant and
    /// surface, flip the running broadcast, and enqueue a publish job for
    /// the scratch file.
    ///
    /// Fails with `NotRunning` when no session exists. A call that loses
    /// the teardown race against a grant revocation is a no-op.
    pub fn stop(&self) -> Result<(), CaptureError> {
        match self.inner.state.compare_exchange(
            ACTIVE,
            STOPPING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                Self::teardown(&self.inner);
                Ok(())
            }
            Err(current) => match SessionState::from_u8(current) {
                // Another trigger won Active → Stopping; nothing left to do.
                SessionState::Stopping => Ok(()),
                // Start still in flight on another thread; there is no
                // active session to stop yet.
                SessionState::Starting | SessionState::Idle => Err(CaptureError::NotRunning),
                SessionState::Active => unreachable!("compare_exchange cannot fail on its target"),
            },
        }
    }

    /// Join all publish jobs enqueued so far, returning their outcomes.
    ///
    /// New sessions may start while publishes are still in flight; this is
    /// for graceful shutdown and bounded test synchronization.
    pub fn wait_for_publishes(&self) -> Vec<Result<Recording, CaptureError>> {
        let handles: Vec<_> = self.inner.publish_handles.lock().drain(..).collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(CaptureError::CatalogWrite("publish job panicked".into())))
            })
            .collect()
    }

    /// Revocation callback target. Runs on a system-driven thread,
    /// concurrently with any in-flight `stop`, and possibly after the
    /// session it belongs to has already ended.
    fn handle_revocation(inner: &Arc<Inner>, generation: u64) {
        if inner.generation.load(Ordering::SeqCst) != generation {
            // Stale callback from a session that already ended; any current
            // session is not ours to touch.
            return;
        }
        inner.revoke_pending.store(generation, Ordering::SeqCst);
        match inner
            .state
            .compare_exchange(ACTIVE, STOPPING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                let _ = inner.revoke_pending.compare_exchange(
                    generation,
                    0,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                log::info!("capture grant revoked externally; stopping session");
                Self::teardown(inner);
            }
            Err(current) if current == STARTING => {
                // start() consumes the latch once it reaches Active. A
                // mismatched generation there means the latch was stale and
                // it is simply ignored.
            }
            Err(_) => {
                // Already stopping or idle; the winner handles everything.
                let _ = inner.revoke_pending.compare_exchange(
                    generation,
                    0,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
            }
        }
    }

    /// Attempt the `Active → Stopping` transition and tear down on success.
    fn try_teardown(inner: &Arc<Inner>) -> bool {
        if inner
            .state
            .compare_exchange(ACTIVE, STOPPING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Self::teardown(inner);
            true
        } else {
            false
        }
    }

    /// Full teardown. Caller must have won the transition into `Stopping`.
    ///
    /// The state always returns to `Idle`: resource-release faults are
    /// logged and the scratch file is still handed to publish/recovery.
    fn teardown(inner: &Arc<Inner>) {
        let resources = inner.resources.lock().take();

        let mut scratch_path: Option<PathBuf> = None;
        if let Some(SessionResources { mut encoder, surface, mut grant }) = resources {
            // Detach the surface first so frame intake stops immediately.
            drop(surface);

            match encoder.finalize_and_release() {
                Ok(summary) => {
                    log::info!(
                        "session finalized: {} frames, {} bytes",
                        summary.frames,
                        summary.bytes_written
                    );
                    scratch_path = Some(summary.scratch_path);
                }
                Err(e) => {
                    log::error!("encoder finalize failed during teardown: {}", e);
                    // Whatever made it to disk is still worth recovering.
                    scratch_path = encoder.scratch_path().map(|p| p.to_path_buf());
                }
            }

            grant.release();
        }

        // Broadcast first: an observer that reads Idle afterwards must not
        // still see the flag as true.
        inner.running.set(false);
        inner.state.store(IDLE, Ordering::SeqCst);

        if let Some(path) = scratch_path {
            match OutputPublisher::spawn_publish(path.clone(), Arc::clone(&inner.catalog)) {
                Ok(handle) => inner.publish_handles.lock().push(handle),
                Err(e) => log::error!(
                    "could not schedule publish for {}: {}; scratch file left in place",
                    path.display(),
                    e
                ),
            }
        }
    }

    fn reset_to_idle(&self) {
        self.inner.running.set(false);
        self.inner.state.store(IDLE, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::frame::RawFrame;
    use crate::models::recording::{Locator, RecordingMetadata};
    use crate::traits::capture_grant::RevocationHandler;
    use std::collections::HashMap;
    use std::io::{self, Write};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct TestGrant {
        release_calls: Arc<AtomicUsize>,
        handler: Arc<Mutex<Option<RevocationHandler>>>,
    }

    impl TestGrant {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<Mutex<Option<RevocationHandler>>>) {
            let release_calls = Arc::new(AtomicUsize::new(0));
            let handler = Arc::new(Mutex::new(None));
            (
                Self {
                    release_calls: Arc::clone(&release_calls),
                    handler: Arc::clone(&handler),
                },
                release_calls,
                handler,
            )
        }
    }

    impl CaptureGrant for TestGrant {
        fn set_on_revoked(&mut self, handler: RevocationHandler) {
            *self.handler.lock() = Some(handler);
        }

        fn release(&mut self) {
            self.release_calls.fetch_add(1, Ordering::SeqCst);
            self.handler.lock().take();
        }
    }

    struct TestBackend;

    impl EncoderBackend for TestBackend {
        fn fourcc(&self) -> [u8; 4] {
            *b"RAW0"
        }

        fn configure(&mut self, config: &SessionConfig) -> Result<(), CaptureError> {
            config.validate().map_err(CaptureError::EncoderConfig)
        }

        fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>, CaptureError> {
            Ok(frame.data.clone())
        }

        fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemCatalog {
        inserts: Mutex<Vec<RecordingMetadata>>,
        blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    struct MemSink {
        key: String,
        blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Write for MemSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.blobs
                .lock()
                .entry(self.key.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CatalogStore for MemCatalog {
        fn insert(&self, metadata: &RecordingMetadata) -> Result<Locator, CaptureError> {
            self.inserts.lock().push(metadata.clone());
            Ok(Locator(metadata.id.clone()))
        }

        fn open_write_sink(
            &self,
            locator: &Locator,
        ) -> Result<Box<dyn Write + Send>, CaptureError> {
            Ok(Box::new(MemSink {
                key: locator.0.clone(),
                blobs: Arc::clone(&self.blobs),
            }))
        }

        fn query(&self) -> Result<Vec<Recording>, CaptureError> {
            Ok(Vec::new())
        }

        fn delete(&self, _locator: &Locator) -> Result<(), CaptureError> {
            Ok(())
        }

        fn rename(&self, _locator: &Locator, _new_name: &str) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    fn test_config(name: &str) -> SessionConfig {
        SessionConfig {
            width: 4,
            height: 2,
            frame_rate: 30,
            bitrate_bps: 512_000,
            scratch_path: std::env::temp_dir().join(format!(
                "controller_test_{}_{}",
                std::process::id(),
                name
            )),
        }
    }

    fn controller() -> (SessionController, Arc<MemCatalog>) {
        let catalog = Arc::new(MemCatalog::default());
        (SessionController::new(catalog.clone()), catalog)
    }

    #[test]
    fn start_stop_walks_the_state_machine_once() {
        let (controller, catalog) = controller();
        let mut watcher = controller.subscribe_running();
        assert!(!watcher.current());
        assert!(controller.state().is_idle());

        let (grant, releases, _) = TestGrant::new();
        controller
            .start(test_config("lifecycle.ivf"), Box::new(grant), Box::new(TestBackend))
            .unwrap();

        assert!(controller.state().is_active());
        assert!(watcher.current());

        controller.stop().unwrap();

        assert!(controller.state().is_idle());
        assert!(!watcher.current());
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 1);
        assert!(published[0].is_ok());
        assert_eq!(catalog.inserts.lock().len(), 1);
    }

    #[test]
    fn start_while_running_fails_and_leaves_session_untouched() {
        let (controller, _) = controller();
        let (grant, _, _) = TestGrant::new();
        controller
            .start(test_config("busy_a.ivf"), Box::new(grant), Box::new(TestBackend))
            .unwrap();

        let (second, second_releases, _) = TestGrant::new();
        let result = controller.start(
            test_config("busy_b.ivf"),
            Box::new(second),
            Box::new(TestBackend),
        );
        assert_eq!(result, Err(CaptureError::AlreadyRunning));
        assert!(controller.state().is_active());
        // The rejected grant is released; the existing session keeps its own.
        assert_eq!(second_releases.load(Ordering::SeqCst), 1);

        controller.stop().unwrap();
        controller.wait_for_publishes();
    }

    #[test]
    fn stop_while_idle_fails_with_not_running() {
        let (controller, catalog) = controller();
        assert_eq!(controller.stop(), Err(CaptureError::NotRunning));
        assert!(controller.state().is_idle());
        assert!(!controller.is_running());
        assert!(catalog.inserts.lock().is_empty());
    }

    #[test]
    fn failed_prepare_releases_grant_and_returns_to_idle() {
        let (controller, catalog) = controller();
        let mut config = test_config("bad.ivf");
        config.width = 0;

        let (grant, releases, _) = TestGrant::new();
        let result = controller.start(config, Box::new(grant), Box::new(TestBackend));

        assert!(matches!(result, Err(CaptureError::EncoderConfig(_))));
        assert!(controller.state().is_idle());
        assert!(!controller.is_running());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(catalog.inserts.lock().is_empty());
    }

    #[test]
    fn revocation_callback_performs_full_teardown() {
        let (controller, catalog) = controller();
        let (grant, releases, handler) = TestGrant::new();
        controller
            .start(test_config("revoked.ivf"), Box::new(grant), Box::new(TestBackend))
            .unwrap();

        // Simulate the system revoking the grant.
        let callback = handler.lock().take().expect("revocation handler registered");
        callback();

        assert!(controller.state().is_idle());
        assert!(!controller.is_running());
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        // A stop after the revocation already tore down is caller misuse.
        assert_eq!(controller.stop(), Err(CaptureError::NotRunning));

        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 1);
        assert_eq!(catalog.inserts.lock().len(), 1);
    }

    #[test]
    fn revocation_during_start_is_honored_once_active() {
        // Grant that is revoked the instant its handler is registered, i.e.
        // while the controller is still in Starting.
        struct InstantRevokeGrant {
            release_calls: Arc<AtomicUsize>,
        }

        impl CaptureGrant for InstantRevokeGrant {
            fn set_on_revoked(&mut self, handler: RevocationHandler) {
                handler();
            }

            fn release(&mut self) {
                self.release_calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (controller, catalog) = controller();
        let releases = Arc::new(AtomicUsize::new(0));
        let grant = InstantRevokeGrant { release_calls: Arc::clone(&releases) };

        controller
            .start(test_config("early_revoke.ivf"), Box::new(grant), Box::new(TestBackend))
            .unwrap();

        // The latched revocation is applied right after Active is reached.
        assert!(controller.state().is_idle());
        assert!(!controller.is_running());
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 1);
        assert!(published[0].is_ok());
        assert_eq!(catalog.inserts.lock().len(), 1);
    }

    #[test]
    fn stale_revocation_after_restart_does_not_affect_new_session() {
        let (controller, _) = controller();

        let (grant_a, releases_a, handler_a) = TestGrant::new();
        controller
            .start(test_config("stale_a.ivf"), Box::new(grant_a), Box::new(TestBackend))
            .unwrap();

        // A system revoker takes the handler out before invoking it, so a
        // release cannot recall a revocation already in flight.
        let stale = handler_a.lock().take().expect("revocation handler registered");

        controller.stop().unwrap();
        assert_eq!(releases_a.load(Ordering::SeqCst), 1);

        let (grant_b, releases_b, _) = TestGrant::new();
        controller
            .start(test_config("stale_b.ivf"), Box::new(grant_b), Box::new(TestBackend))
            .unwrap();

        // The first session's revocation lands late; the second session
        // must not notice.
        stale();
        assert!(controller.state().is_active());
        assert!(controller.is_running());
        assert_eq!(releases_b.load(Ordering::SeqCst), 0);

        controller.stop().unwrap();
        assert_eq!(releases_b.load(Ordering::SeqCst), 1);

        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|p| p.is_ok()));
    }

    #[test]
    fn revocation_during_encoder_setup_stops_the_session() {
        // Backend whose configure step fires the grant's revocation, as a
        // grant dying while the encoder is still being prepared would.
        struct RevokingBackend {
            trigger: Arc<Mutex<Option<RevocationHandler>>>,
        }

        impl EncoderBackend for RevokingBackend {
            fn fourcc(&self) -> [u8; 4] {
                *b"RAW0"
            }

            fn configure(&mut self, config: &SessionConfig) -> Result<(), CaptureError> {
                config.validate().map_err(CaptureError::EncoderConfig)?;
                if let Some(handler) = self.trigger.lock().take() {
                    handler();
                }
                Ok(())
            }

            fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>, CaptureError> {
                Ok(frame.data.clone())
            }

            fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
                Ok(Vec::new())
            }
        }

        let (controller, catalog) = controller();
        let (grant, releases, handler) = TestGrant::new();
        let backend = RevokingBackend { trigger: Arc::clone(&handler) };

        controller
            .start(test_config("prepare_revoke.ivf"), Box::new(grant), Box::new(backend))
            .unwrap();

        assert!(controller.state().is_idle());
        assert!(!controller.is_running());
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 1);
        assert!(published[0].is_ok());
        assert_eq!(catalog.inserts.lock().len(), 1);
    }

    #[test]
    fn encoder_fault_still_reaches_idle_and_publishes_partial_output() {
        struct FaultyBackend;

        impl EncoderBackend for FaultyBackend {
            fn fourcc(&self) -> [u8; 4] {
                *b"RAW0"
            }

            fn configure(&mut self, config: &SessionConfig) -> Result<(), CaptureError> {
                config.validate().map_err(CaptureError::EncoderConfig)
            }

            fn encode(&mut self, _frame: &RawFrame) -> Result<Vec<u8>, CaptureError> {
                Err(CaptureError::Encoder("hardware fault".into()))
            }

            fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
                Ok(Vec::new())
            }
        }

        let (controller, catalog) = controller();
        let (grant, releases, _) = TestGrant::new();
        controller
            .start(test_config("faulty.ivf"), Box::new(grant), Box::new(FaultyBackend))
            .unwrap();

        let surface = controller.capture_surface().expect("active surface");
        surface
            .submit_frame(RawFrame {
                data: vec![0x11; 4 * 2 * 4],
                width: 4,
                height: 2,
                pts_micros: 0,
            })
            .unwrap();
        drop(surface);

        controller.stop().unwrap();

        // The pipeline fault never wedges the state machine.
        assert!(controller.state().is_idle());
        assert!(!controller.is_running());
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        // Whatever made it to disk is still published for recovery; here
        // only the container header.
        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 1);
        let recording = published[0].as_ref().unwrap();
        assert_eq!(recording.size_bytes, 32);
        assert_eq!(catalog.inserts.lock().len(), 1);
    }

    #[test]
    fn running_broadcast_clears_no_later_than_idle() {
        let (controller, _) = controller();
        let (grant, _, _) = TestGrant::new();
        controller
            .start(test_config("broadcast_order.ivf"), Box::new(grant), Box::new(TestBackend))
            .unwrap();

        // Reads state first, then the flag: once Idle is visible the flag
        // must already read false.
        let observer = controller.clone();
        let flag_when_idle = thread::spawn(move || loop {
            let state = observer.state();
            let running = observer.is_running();
            if state.is_idle() {
                return running;
            }
            thread::yield_now();
        });

        thread::sleep(Duration::from_millis(10));
        controller.stop().unwrap();

        assert!(!flag_when_idle.join().unwrap());
        controller.wait_for_publishes();
    }

    #[test]
    fn frames_reach_the_published_recording() {
        let (controller, catalog) = controller();
        let (grant, _, _) = TestGrant::new();
        controller
            .start(test_config("frames.ivf"), Box::new(grant), Box::new(TestBackend))
            .unwrap();

        let surface = controller.capture_surface().expect("active surface");
        for i in 0..10u64 {
            surface
                .submit_frame(RawFrame {
                    data: vec![0x77; 4 * 2 * 4],
                    width: 4,
                    height: 2,
                    pts_micros: i * 33_333,
                })
                .unwrap();
        }
        drop(surface);

        controller.stop().unwrap();
        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 1);
        let recording = published[0].as_ref().unwrap();
        assert!(recording.size_bytes > 0);

        let blobs = catalog.blobs.lock();
        let blob = blobs.get(&recording.locator.0).unwrap();
        assert_eq!(blob.len() as u64, recording.size_bytes);
        assert_eq!(&blob[0..4], b"DKIF");
    }

    #[test]
    fn sessions_back_to_back_reuse_nothing() {
        let (controller, catalog) = controller();

        for i in 0..3 {
            let (grant, releases, _) = TestGrant::new();
            controller
                .start(
                    test_config(&format!("serial_{}.ivf", i)),
                    Box::new(grant),
                    Box::new(TestBackend),
                )
                .unwrap();
            controller.stop().unwrap();
            assert_eq!(releases.load(Ordering::SeqCst), 1);
        }

        let published = controller.wait_for_publishes();
        assert_eq!(published.len(), 3);
        assert!(published.iter().all(|p| p.is_ok()));
        assert_eq!(catalog.inserts.lock().len(), 3);

        // Watchers that resume late still see the settled value.
        let mut watcher = controller.subscribe_running();
        assert!(!watcher.wait_for(true, Duration::from_millis(10)));
    }
}
