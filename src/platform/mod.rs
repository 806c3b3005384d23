//! Platform abstraction layer.
//!
//! Defines the `PointerExecutor` trait used by the injector to move the
//! pointer and to hold the OS idle-suppression flag.
//! Platform-specific implementations live in child modules.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
pub use linux::create_pointer_executor;
#[cfg(target_os = "macos")]
pub use macos::create_pointer_executor;
#[cfg(target_os = "windows")]
pub use windows::create_pointer_executor;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by platform backends.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The backend cannot run in this session (no display, unsupported OS).
    #[error("platform backend unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Executor trait
// ---------------------------------------------------------------------------

/// Submits synthetic pointer activity to the operating system.
///
/// Implementations must use the injection path the OS counts as user
/// activity. Assigning the cursor position directly does not reset the idle
/// timer on most systems.
pub trait PointerExecutor {
    /// Moves the pointer by `(dx, dy)` pixels relative to its current position.
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PlatformError>;

    /// Acquires (`true`) or releases (`false`) the process-wide request that
    /// keeps the display on and the system awake.
    fn set_idle_suppression(&mut self, enabled: bool) -> Result<(), PlatformError>;
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn create_pointer_executor() -> Result<Box<dyn PointerExecutor>, PlatformError> {
    Err(PlatformError::Unavailable(
        "no pointer backend for this operating system".into(),
    ))
}
