//! wiggled -- keeps a desktop session awake by wiggling the pointer.
//!
//! Entry point: argument parsing, logging, settings, platform backend
//! selection and the event loop.

mod config;
mod control;
mod event_loop;
mod injector;
mod pattern;
mod platform;
mod scheduler;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Instant;

use argh::FromArgs;

use config::{ConfigError, Settings};
use injector::InputInjector;
use platform::PlatformError;
use scheduler::WiggleScheduler;

/// Periodically nudges the pointer so the session does not idle-lock.
#[derive(FromArgs)]
struct Cli {
    /// start paused regardless of the saved settings
    #[argh(switch)]
    disabled: bool,

    /// settings file (default: <config dir>/wiggled/settings.toml)
    #[argh(option)]
    config: Option<PathBuf>,

    /// print the version and exit
    #[argh(switch)]
    version: bool,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("failed to start control input: {0}")]
    Control(std::io::Error),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn main() -> ExitCode {
    let cli: Cli = argh::from_env();
    if cli.version {
        println!("wiggled v{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let settings_path = cli.config.or_else(config::default_settings_path);
    let settings = match &settings_path {
        Some(path) => Settings::load(path)?,
        None => {
            log::warn!("config: no config directory, settings will not persist");
            Settings::default()
        }
    };

    let injector = InputInjector::new(platform::create_pointer_executor()?);
    let mut scheduler = WiggleScheduler::new(settings, cli.disabled, injector, Instant::now())?;

    let (tx, rx) = mpsc::channel();
    // This sender lives as long as the process, so stdin EOF never ends the loop.
    let quit_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(control::Command::Quit);
    })?;
    control::spawn_console(tx).map_err(AppError::Control)?;
    log::info!("{}", control::HELP);

    event_loop::run(&mut scheduler, &rx, settings_path.as_deref());
    log::info!("wiggled: stopped");
    Ok(())
}
