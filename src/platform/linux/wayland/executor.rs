//! Wayland pointer executor via xdg-desktop-portal.
//!
//! `LinuxWaylandExecutor` implements the `PointerExecutor` trait. `new()` spawns a
//! background thread that owns a single-threaded tokio runtime; that runtime runs
//! the RemoteDesktop session setup and then loops waiting for commands.
//!
//! Trait calls enqueue commands via a `tokio::sync::mpsc` channel using the
//! non-blocking `try_send()`, so the event loop never waits on D-Bus.
//!
//! Motion is delivered asynchronously, so a failed `notify_pointer_motion`
//! is reported on the next `move_relative()` call instead of the one that
//! queued it.
//!
//! Idle suppression goes through the Inhibit portal. The inhibition lives as
//! long as its request object; releasing it closes the request.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ashpd::desktop::{
    inhibit::{InhibitFlags, InhibitProxy},
    remote_desktop::{DeviceType, RemoteDesktop},
    PersistMode, Request,
};
use tokio::sync::mpsc;

use crate::platform::{PlatformError, PointerExecutor};

// ---------------------------------------------------------------------------
// Internal command type
// ---------------------------------------------------------------------------

/// A command sent from the trait methods to the portal task.
#[derive(Debug)]
enum PortalCmd {
    /// Relative pointer motion in logical pixels.
    Motion {
        dx: f64,
        dy: f64,
        /// Enqueue time, to measure end-to-end injection latency.
        queued_at: std::time::Instant,
    },
    /// Acquire (`true`) or release (`false`) the idle inhibition.
    Inhibit(bool),
}

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// Injects pointer motion via the RemoteDesktop portal on Wayland.
///
/// Maintains a long-lived portal session on a background thread.
/// Trait calls are non-blocking: commands are queued and processed asynchronously.
pub struct LinuxWaylandExecutor {
    /// Bounded channel to the portal task (capacity `CMD_CAPACITY`).
    cmd_tx: mpsc::Sender<PortalCmd>,
    /// Set by the portal task when a queued motion failed.
    motion_failed: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

/// Channel capacity for pending commands.
/// A wiggle queues at most four motions per interval, so this never fills
/// unless the portal is stuck.
const CMD_CAPACITY: usize = 64;

/// Reason shown by the desktop for the inhibition.
const INHIBIT_REASON: &str = "Keeping the session awake";

impl LinuxWaylandExecutor {
    /// Creates the executor and launches the background portal session.
    ///
    /// The portal session is established asynchronously on the background thread.
    /// The first wiggle may be queued before the session is ready; the portal
    /// task processes commands only after the session is established.
    pub fn new() -> Result<Self, PlatformError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PortalCmd>(CMD_CAPACITY);
        let motion_failed = Arc::new(AtomicBool::new(false));
        let task_failed = Arc::clone(&motion_failed);

        let thread = thread::Builder::new()
            .name("portal".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        log::error!("executor: failed to build tokio runtime: {e}");
                        return;
                    }
                };
                rt.block_on(run_executor(cmd_rx, task_failed));
            })
            .map_err(|e| PlatformError::Other(format!("failed to spawn portal thread: {e}")))?;

        Ok(Self {
            cmd_tx,
            motion_failed,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: PortalCmd) -> Result<(), PlatformError> {
        match self.cmd_tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("executor: portal channel full, command dropped");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(PlatformError::Other("portal session closed".into()))
            }
        }
    }
}

impl Drop for LinuxWaylandExecutor {
    fn drop(&mut self) {
        // Dropping cmd_tx closes the channel; the portal task releases any
        // inhibition and exits its loop. The thread is detached.
        drop(self.thread.take());
    }
}

// ---------------------------------------------------------------------------
// PointerExecutor trait impl
// ---------------------------------------------------------------------------

impl PointerExecutor for LinuxWaylandExecutor {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PlatformError> {
        self.send(PortalCmd::Motion {
            dx: f64::from(dx),
            dy: f64::from(dy),
            queued_at: std::time::Instant::now(),
        })?;
        if self.motion_failed.swap(false, Ordering::Relaxed) {
            return Err(PlatformError::Other(
                "an earlier pointer motion was rejected by the portal".into(),
            ));
        }
        Ok(())
    }

    fn set_idle_suppression(&mut self, enabled: bool) -> Result<(), PlatformError> {
        self.send(PortalCmd::Inhibit(enabled))
    }
}

// ---------------------------------------------------------------------------
// Async portal task
// ---------------------------------------------------------------------------

/// Runs on the background thread's tokio runtime.
/// Creates the RemoteDesktop portal session, then processes commands
/// until the command channel is closed (executor is dropped).
async fn run_executor(mut cmd_rx: mpsc::Receiver<PortalCmd>, motion_failed: Arc<AtomicBool>) {
    if let Err(e) = executor_loop(&mut cmd_rx, &motion_failed).await {
        log::error!("executor: {e}");
    }
}

async fn executor_loop(
    cmd_rx: &mut mpsc::Receiver<PortalCmd>,
    motion_failed: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let portal = RemoteDesktop::new().await?;
    let session = portal.create_session().await?;

    // Load any previously saved restore token so the permission dialog is
    // skipped on runs after the initial grant.
    let saved_token = load_restore_token();
    portal
        .select_devices(
            &session,
            DeviceType::Pointer.into(),
            saved_token.as_deref(),
            PersistMode::ExplicitlyRevoked,
        )
        .await?;

    let start_response = portal.start(&session, None).await?;

    if let Some(token) = start_response.response()?.restore_token() {
        save_restore_token(token);
    }

    log::info!("executor: RemoteDesktop session active");

    let mut inhibitor = Inhibitor::default();

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            PortalCmd::Motion { dx, dy, queued_at } => {
                if let Err(e) = portal.notify_pointer_motion(&session, dx, dy).await {
                    log::warn!("executor: notify_pointer_motion failed: {e}");
                    motion_failed.store(true, Ordering::Relaxed);
                } else {
                    log::trace!(
                        "executor: moved pointer by ({dx}, {dy}) in {:.2}ms",
                        queued_at.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            PortalCmd::Inhibit(enabled) => inhibitor.set(enabled).await,
        }
    }

    inhibitor.set(false).await;
    log::info!("executor: command channel closed, exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Idle inhibition
// ---------------------------------------------------------------------------

/// Holds the open Inhibit portal request while suppression is on.
#[derive(Default)]
struct Inhibitor {
    request: Option<Request<()>>,
}

impl Inhibitor {
    async fn set(&mut self, enabled: bool) {
        match (enabled, self.request.take()) {
            (true, Some(request)) => self.request = Some(request),
            (true, None) => match acquire_inhibit().await {
                Ok(request) => {
                    log::debug!("executor: idle suppression on");
                    self.request = Some(request);
                }
                Err(e) => log::warn!("executor: inhibit request failed: {e}"),
            },
            (false, Some(request)) => match request.close().await {
                Ok(()) => log::debug!("executor: idle suppression off"),
                Err(e) => log::warn!("executor: closing inhibit request failed: {e}"),
            },
            (false, None) => {}
        }
    }
}

async fn acquire_inhibit() -> Result<Request<()>, ashpd::Error> {
    let proxy = InhibitProxy::new().await?;
    proxy
        .inhibit(None, InhibitFlags::Idle | InhibitFlags::Suspend, INHIBIT_REASON)
        .await
}

// ---------------------------------------------------------------------------
// Restore token helpers
// ---------------------------------------------------------------------------

/// Returns the path used to persist the RemoteDesktop restore token.
fn token_path() -> Option<PathBuf> {
    crate::config::config_dir().map(|dir| dir.join("remote-desktop-token"))
}

/// Reads the restore token from disk. Returns `None` if the file is absent or
/// cannot be read.
fn load_restore_token() -> Option<String> {
    let path = token_path()?;
    let token = std::fs::read_to_string(&path).ok()?;
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    log::debug!("executor: loaded restore token from {}", path.display());
    Some(trimmed.to_owned())
}

/// Writes the restore token to disk, creating the parent directory if needed.
fn save_restore_token(token: &str) {
    let Some(path) = token_path() else { return };
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::warn!(
                "executor: could not create config dir {}: {e}",
                dir.display()
            );
            return;
        }
    }
    match std::fs::write(&path, token) {
        Ok(()) => log::debug!("executor: restore token saved to {}", path.display()),
        Err(e) => log::warn!("executor: could not save restore token: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(cmd_tx: mpsc::Sender<PortalCmd>) -> LinuxWaylandExecutor {
        LinuxWaylandExecutor {
            cmd_tx,
            motion_failed: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    #[test]
    fn motion_is_queued_as_float_delta() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<PortalCmd>(4);
        let mut executor = detached(cmd_tx);

        executor.move_relative(-3, 7).unwrap();

        match cmd_rx.try_recv().unwrap() {
            PortalCmd::Motion { dx, dy, .. } => assert_eq!((dx, dy), (-3.0, 7.0)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn portal_failure_surfaces_on_next_motion() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<PortalCmd>(4);
        let mut executor = detached(cmd_tx);
        executor.motion_failed.store(true, Ordering::Relaxed);

        assert!(executor.move_relative(1, 0).is_err());
        // The motion was still queued, and the failure is reported once.
        assert!(matches!(cmd_rx.try_recv().unwrap(), PortalCmd::Motion { .. }));
        assert!(executor.move_relative(-1, 0).is_ok());
    }

    #[test]
    fn idle_suppression_is_queued() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<PortalCmd>(4);
        let mut executor = detached(cmd_tx);

        executor.set_idle_suppression(true).unwrap();

        assert!(matches!(cmd_rx.try_recv().unwrap(), PortalCmd::Inhibit(true)));
    }

    #[test]
    fn motion_on_full_channel_returns_ok() {
        let (cmd_tx, _cmd_rx) = mpsc::channel::<PortalCmd>(1);
        cmd_tx.try_send(PortalCmd::Inhibit(true)).unwrap();
        let mut executor = detached(cmd_tx);

        // Overflow drops the command rather than failing the wiggle.
        assert!(executor.move_relative(1, 0).is_ok());
    }

    #[test]
    fn motion_on_closed_channel_returns_error() {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PortalCmd>(1);
        drop(cmd_rx);
        let mut executor = detached(cmd_tx);

        assert!(executor.move_relative(1, 0).is_err());
    }
}
