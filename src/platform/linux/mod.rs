//! Linux platform backend.
//!
//! Injection and idle suppression depend on the display server:
//! 1. `WAYLAND_DISPLAY` set  → RemoteDesktop + Inhibit portals via `LinuxWaylandExecutor`
//! 2. `DISPLAY` only (X11)   → XTest + core screen saver via `LinuxX11Executor`
//! 3. Neither variable set   → no display, clear error

mod detect;
mod wayland;
mod x11;

use wayland::LinuxWaylandExecutor;
use x11::LinuxX11Executor;

use crate::platform::{PlatformError, PointerExecutor};
use detect::{detect_display_server, DisplayServer};

// ---------------------------------------------------------------------------
// Factory: pointer executor
// ---------------------------------------------------------------------------

/// Returns the appropriate `PointerExecutor` for the current session.
pub fn create_pointer_executor() -> Result<Box<dyn PointerExecutor>, PlatformError> {
    match detect_display_server() {
        Some(DisplayServer::Wayland) => {
            log::info!("executor: using Wayland portal backend");
            LinuxWaylandExecutor::new().map(|e| Box::new(e) as Box<dyn PointerExecutor>)
        }
        Some(DisplayServer::X11) => {
            log::info!("executor: using X11 XTest backend");
            LinuxX11Executor::connect().map(|e| Box::new(e) as Box<dyn PointerExecutor>)
        }
        None => Err(PlatformError::Unavailable(
            "No display server detected.".into(),
        )),
    }
}
