//! Windows pointer executor via SendInput.
//!
//! `WindowsExecutor` implements `PointerExecutor`. Injection is synchronous:
//! `SendInput` returns after the event is queued. Events sent this way reset
//! the session idle timer, unlike `SetCursorPos`.
//!
//! Idle suppression uses `SetThreadExecutionState`, which is scoped to the
//! calling thread. The event loop owns the executor, so acquire and release
//! always happen on the same thread.

use windows_sys::Win32::System::Power::{
    SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED, ES_SYSTEM_REQUIRED,
    EXECUTION_STATE,
};
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_MOVE, MOUSEINPUT,
};

use crate::platform::{PlatformError, PointerExecutor};

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// Injects relative mouse motion via SendInput on Windows.
///
/// Stateless apart from the idle flag: each `move_relative()` call builds a
/// single `INPUT` record and calls `SendInput` synchronously.
pub struct WindowsExecutor {
    suppressing: bool,
}

impl WindowsExecutor {
    pub fn new() -> Self {
        WindowsExecutor { suppressing: false }
    }
}

impl Default for WindowsExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Execution state flags for the requested idle-suppression state.
fn execution_state(enabled: bool) -> EXECUTION_STATE {
    if enabled {
        ES_CONTINUOUS | ES_SYSTEM_REQUIRED | ES_DISPLAY_REQUIRED
    } else {
        ES_CONTINUOUS
    }
}

/// Builds a relative-motion `INPUT` record.
fn motion_input(dx: i32, dy: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: MOUSEEVENTF_MOVE,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

// ---------------------------------------------------------------------------
// PointerExecutor trait impl
// ---------------------------------------------------------------------------

impl PointerExecutor for WindowsExecutor {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PlatformError> {
        let input = motion_input(dx, dy);
        let sent = unsafe { SendInput(1, &input, std::mem::size_of::<INPUT>() as i32) };

        if sent == 0 {
            return Err(PlatformError::Other("SendInput returned 0".into()));
        }

        log::trace!("executor: moved pointer by ({dx}, {dy})");
        Ok(())
    }

    fn set_idle_suppression(&mut self, enabled: bool) -> Result<(), PlatformError> {
        if self.suppressing == enabled {
            return Ok(());
        }

        let previous = unsafe { SetThreadExecutionState(execution_state(enabled)) };
        if previous == 0 {
            return Err(PlatformError::Other(
                "SetThreadExecutionState returned 0".into(),
            ));
        }

        self.suppressing = enabled;
        log::debug!("executor: idle suppression {}", if enabled { "on" } else { "off" });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_state_keeps_display_and_system_awake() {
        let flags = execution_state(true);
        assert_ne!(flags & ES_DISPLAY_REQUIRED, 0);
        assert_ne!(flags & ES_SYSTEM_REQUIRED, 0);
        assert_ne!(flags & ES_CONTINUOUS, 0);
    }

    #[test]
    fn disabled_state_only_clears() {
        assert_eq!(execution_state(false), ES_CONTINUOUS);
    }

    #[test]
    fn motion_input_is_relative_move() {
        let input = motion_input(3, -2);
        assert_eq!(input.r#type, INPUT_MOUSE);
        let mi = unsafe { input.Anonymous.mi };
        assert_eq!((mi.dx, mi.dy), (3, -2));
        assert_eq!(mi.dwFlags, MOUSEEVENTF_MOVE);
    }

    /// Releasing a flag that was never acquired must not touch the OS.
    #[test]
    fn release_without_acquire_is_noop() {
        let mut executor = WindowsExecutor::default();
        assert!(!executor.suppressing);
        assert!(executor.set_idle_suppression(false).is_ok());
    }
}
