//! Windows platform backend: SendInput injection, SetThreadExecutionState
//! idle suppression.

mod executor;

use executor::WindowsExecutor;

use crate::platform::{PlatformError, PointerExecutor};

/// Returns a `WindowsExecutor` backed by `SendInput`.
pub fn create_pointer_executor() -> Result<Box<dyn PointerExecutor>, PlatformError> {
    Ok(Box::new(WindowsExecutor::new()))
}
