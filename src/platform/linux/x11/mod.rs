//! X11 platform backend: XTest injection, core screen saver control.

mod executor;

pub use executor::LinuxX11Executor;
