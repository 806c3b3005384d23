//! X11 pointer executor via the XTEST extension.
//!
//! `LinuxX11Executor` implements `PointerExecutor`. `FakeInput` with
//! `MotionNotify` and detail 1 moves the pointer relative to its current
//! position and resets the server idle timer like real hardware input.
//!
//! Idle suppression sets the core screen saver timeout to 0 and restores the
//! values read at acquire time on release. DPMS is left alone.

use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xproto::{
    Blanking, ConnectionExt as _, Exposures, Window, MOTION_NOTIFY_EVENT,
};
use x11rb::protocol::xtest::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;
use x11rb::CURRENT_TIME;

use crate::platform::{PlatformError, PointerExecutor};

/// XTest `detail` value selecting relative motion for `MotionNotify`.
const RELATIVE_MOTION: u8 = 1;

/// Screen saver settings captured before suppression, restored afterwards.
#[derive(Debug, Clone, Copy)]
struct SavedScreenSaver {
    timeout: i16,
    interval: i16,
    prefer_blanking: Blanking,
    allow_exposures: Exposures,
}

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// Injects pointer motion via XTest on an X11 display.
pub struct LinuxX11Executor {
    conn: RustConnection,
    root: Window,
    saved: Option<SavedScreenSaver>,
}

impl LinuxX11Executor {
    /// Connects to `$DISPLAY` and verifies XTEST is available.
    pub fn connect() -> Result<Self, PlatformError> {
        let (conn, screen_num) = x11rb::connect(None)
            .map_err(|e| PlatformError::Unavailable(format!("X11 connect failed: {e}")))?;

        let has_xtest = conn
            .extension_information(xtest::X11_EXTENSION_NAME)
            .map_err(other)?
            .is_some();
        if !has_xtest {
            return Err(PlatformError::Unavailable(
                "X server does not support the XTEST extension".into(),
            ));
        }

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| PlatformError::Other(format!("no X11 screen {screen_num}")))?;

        Ok(Self {
            conn,
            root,
            saved: None,
        })
    }
}

impl Drop for LinuxX11Executor {
    fn drop(&mut self) {
        if let Err(e) = self.set_idle_suppression(false) {
            log::debug!("executor: restoring screen saver failed: {e}");
        }
    }
}

fn other(e: impl std::fmt::Display) -> PlatformError {
    PlatformError::Other(e.to_string())
}

/// XTest coordinates are 16-bit; larger deltas saturate. The range is
/// symmetric so `d` and `-d` still cancel out.
fn saturate(v: i32) -> i16 {
    v.clamp(-i32::from(i16::MAX), i32::from(i16::MAX)) as i16
}

/// The server reports unsigned seconds but takes signed ones back.
fn to_request_secs(v: u16) -> i16 {
    i16::try_from(v).unwrap_or(i16::MAX)
}

// ---------------------------------------------------------------------------
// PointerExecutor trait impl
// ---------------------------------------------------------------------------

impl PointerExecutor for LinuxX11Executor {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PlatformError> {
        self.conn
            .xtest_fake_input(
                MOTION_NOTIFY_EVENT,
                RELATIVE_MOTION,
                CURRENT_TIME,
                self.root,
                saturate(dx),
                saturate(dy),
                0,
            )
            .map_err(other)?;
        self.conn.flush().map_err(other)?;

        log::trace!("executor: moved pointer by ({dx}, {dy})");
        Ok(())
    }

    fn set_idle_suppression(&mut self, enabled: bool) -> Result<(), PlatformError> {
        match (enabled, self.saved) {
            (true, Some(_)) | (false, None) => Ok(()),
            (true, None) => {
                let reply = self
                    .conn
                    .get_screen_saver()
                    .map_err(other)?
                    .reply()
                    .map_err(other)?;
                let saved = SavedScreenSaver {
                    timeout: to_request_secs(reply.timeout),
                    interval: to_request_secs(reply.interval),
                    prefer_blanking: reply.prefer_blanking,
                    allow_exposures: reply.allow_exposures,
                };

                self.conn
                    .set_screen_saver(0, saved.interval, saved.prefer_blanking, saved.allow_exposures)
                    .map_err(other)?
                    .check()
                    .map_err(other)?;

                self.saved = Some(saved);
                log::debug!(
                    "executor: idle suppression on (saved timeout {}s)",
                    saved.timeout
                );
                Ok(())
            }
            (false, Some(saved)) => {
                self.saved = None;
                self.conn
                    .set_screen_saver(
                        saved.timeout,
                        saved.interval,
                        saved.prefer_blanking,
                        saved.allow_exposures,
                    )
                    .map_err(other)?
                    .check()
                    .map_err(other)?;
                log::debug!("executor: idle suppression off");
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    #[test]
    fn small_deltas_pass_through() {
        assert_eq!(saturate(4), 4);
        assert_eq!(saturate(-4), -4);
        assert_eq!(saturate(0), 0);
    }

    #[test]
    fn large_deltas_saturate() {
        assert_eq!(saturate(100_000), i16::MAX);
        assert_eq!(saturate(-100_000), -i16::MAX);
    }

    #[test]
    fn saturated_wiggles_return_to_origin() {
        for pattern in [Pattern::Linear, Pattern::Circular] {
            for d in [32_767, 32_768, 40_000, u32::MAX] {
                let net = pattern
                    .displacement(d)
                    .steps
                    .iter()
                    .fold((0i32, 0i32), |(x, y), &(dx, dy)| {
                        (x + i32::from(saturate(dx)), y + i32::from(saturate(dy)))
                    });
                assert_eq!(net, (0, 0), "{pattern} at {d}px");
            }
        }
    }

    #[test]
    fn timeout_conversion_saturates() {
        assert_eq!(to_request_secs(600), 600);
        assert_eq!(to_request_secs(u16::MAX), i16::MAX);
    }
}
