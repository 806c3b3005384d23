//! Wayland platform backend: RemoteDesktop portal (injection) and Inhibit
//! portal (idle suppression).

mod executor;

pub use executor::LinuxWaylandExecutor;
