//! Display server detection for Linux.
//!
//! Determines whether the current session is Wayland or X11-only by inspecting
//! the environment variables set by the session manager.
//! The result picks the pointer backend at startup.
//!
//! Note: `DISPLAY` being set alongside `WAYLAND_DISPLAY` means XWayland is
//! running. XTest motion injected there only reaches XWayland clients and
//! does not reset the compositor's idle timer, so the portal path wins.

use std::env;

// ---------------------------------------------------------------------------
// Display server type
// ---------------------------------------------------------------------------

/// The active Linux display server protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    /// Wayland session. `WAYLAND_DISPLAY` is set (with or without `DISPLAY`).
    Wayland,
    /// Pure X11 session. Only `DISPLAY` is set; no Wayland compositor present.
    X11,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Detects the active display server from environment variables.
///
/// Returns `None` when neither `WAYLAND_DISPLAY` nor `DISPLAY` is set,
/// which indicates the process is running outside of any graphical session.
pub fn detect_display_server() -> Option<DisplayServer> {
    let has_wayland = env::var_os("WAYLAND_DISPLAY")
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    let has_display = env::var_os("DISPLAY")
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    classify_display(has_wayland, has_display)
}

/// Classifies the display server from boolean presence flags.
///
/// Split out so it can be tested without mutating the process environment.
fn classify_display(has_wayland: bool, has_display: bool) -> Option<DisplayServer> {
    match (has_wayland, has_display) {
        (true, _) => Some(DisplayServer::Wayland),
        (false, true) => Some(DisplayServer::X11),
        (false, false) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wayland_only_detects_wayland() {
        assert_eq!(classify_display(true, false), Some(DisplayServer::Wayland));
    }

    #[test]
    fn xwayland_session_still_uses_portal() {
        assert_eq!(classify_display(true, true), Some(DisplayServer::Wayland));
    }

    #[test]
    fn display_only_detects_x11() {
        assert_eq!(classify_display(false, true), Some(DisplayServer::X11));
    }

    #[test]
    fn no_vars_returns_none() {
        assert_eq!(classify_display(false, false), None);
    }
}
