//! macOS platform backend.
//!
//! Injection: CGEventPost (synchronous) via `MacOSExecutor`.
//! Idle suppression: an IOKit power-management assertion.
//!
//! Posting synthetic events requires Accessibility permission. Without it
//! the events are dropped silently by the window server, so the factory only
//! warns. Guide the user to:
//!   System Settings > Privacy & Security > Accessibility

mod executor;

use executor::MacOSExecutor;

use crate::platform::{PlatformError, PointerExecutor};

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
}

/// Returns the CGEventPost-based pointer executor.
pub fn create_pointer_executor() -> Result<Box<dyn PointerExecutor>, PlatformError> {
    if !unsafe { AXIsProcessTrusted() } {
        log::warn!(
            "executor: Accessibility permission not granted; pointer events may be ignored"
        );
    }
    Ok(Box::new(MacOSExecutor::new()))
}
