//! Cooperative single-threaded event loop.
//!
//! The loop owns the scheduler. It blocks on the command channel until the
//! scheduler's next deadline, so wiggles and control commands are strictly
//! serialized on one thread and need no locking.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

use crate::config::Settings;
use crate::control::Command;
use crate::injector::Injector;
use crate::scheduler::WiggleScheduler;

/// Runs until `Command::Quit` or until every sender is gone.
///
/// Settings changes are written to `settings_path` when one is given.
/// Idle suppression is released before returning.
pub fn run<I: Injector>(
    scheduler: &mut WiggleScheduler<I>,
    commands: &Receiver<Command>,
    settings_path: Option<&Path>,
) {
    loop {
        scheduler.poll(Instant::now());

        let received = match scheduler.next_deadline() {
            Some(deadline) => {
                commands.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(cmd) => {
                if handle(scheduler, cmd, settings_path).is_break() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::debug!("event loop: control channel closed");
                break;
            }
        }
    }

    scheduler.shutdown();
}

fn handle<I: Injector>(
    scheduler: &mut WiggleScheduler<I>,
    cmd: Command,
    settings_path: Option<&Path>,
) -> ControlFlow<()> {
    let now = Instant::now();
    let updated = match cmd {
        Command::Toggle => Some(scheduler.toggle(now)),
        Command::SetInterval(secs) => match scheduler.set_interval(secs, now) {
            Ok(settings) => Some(settings),
            Err(e) => {
                eprintln!("{e}");
                None
            }
        },
        Command::SetPattern(pattern) => Some(scheduler.set_pattern(pattern)),
        Command::SetDistance(pixels) => Some(scheduler.set_distance(pixels)),
        Command::Status => {
            println!("{}", status_line(scheduler));
            None
        }
        Command::Quit => return ControlFlow::Break(()),
    };

    if let (Some(settings), Some(path)) = (updated, settings_path) {
        persist(&settings, path);
    }
    ControlFlow::Continue(())
}

fn persist(settings: &Settings, path: &Path) {
    if let Err(e) = settings.save(path) {
        log::warn!("config: could not save settings: {e}");
    }
}

fn status_line<I: Injector>(scheduler: &WiggleScheduler<I>) -> String {
    let s = scheduler.settings();
    let mut line = format!(
        "{} | every {}s | {} | {}px",
        if scheduler.is_running() { "active" } else { "paused" },
        s.interval_secs,
        s.pattern,
        s.pixel_distance
    );
    if let Some(deadline) = scheduler.next_deadline() {
        let left = deadline.saturating_duration_since(Instant::now());
        line.push_str(&format!(" | next in {}s", left.as_secs()));
    }
    let failures = scheduler.injector().consecutive_failures();
    if failures > 0 {
        line.push_str(&format!(" | {failures} failed wiggle(s)"));
    }
    line
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use std::sync::mpsc;

    #[derive(Default)]
    struct RecordingInjector {
        wiggles: Vec<(Pattern, u32)>,
        idle: Vec<bool>,
    }

    impl Injector for RecordingInjector {
        fn inject(&mut self, pattern: Pattern, distance: u32) {
            self.wiggles.push((pattern, distance));
        }

        fn set_idle_suppression(&mut self, enabled: bool) {
            self.idle.push(enabled);
        }
    }

    fn paused_scheduler() -> WiggleScheduler<RecordingInjector> {
        WiggleScheduler::new(
            Settings::default(),
            true,
            RecordingInjector::default(),
            Instant::now(),
        )
        .unwrap()
    }

    #[test]
    fn commands_update_and_persist_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut scheduler = paused_scheduler();
        let (tx, rx) = mpsc::channel();

        for cmd in [
            Command::SetInterval(120),
            Command::SetPattern(Pattern::Circular),
            Command::SetDistance(3),
            Command::SetInterval(0),
            Command::Status,
            Command::Quit,
        ] {
            tx.send(cmd).unwrap();
        }
        run(&mut scheduler, &rx, Some(&path));

        let saved = Settings::load(&path).unwrap();
        assert_eq!(saved.interval_secs, 120);
        assert_eq!(saved.pattern, Pattern::Circular);
        assert_eq!(saved.pixel_distance, 3);
        assert_eq!(saved, scheduler.settings());
        assert!(scheduler.injector().wiggles.is_empty());
    }

    #[test]
    fn quit_releases_idle_suppression() {
        let mut scheduler = paused_scheduler();
        let (tx, rx) = mpsc::channel();
        tx.send(Command::Toggle).unwrap();
        tx.send(Command::Quit).unwrap();

        run(&mut scheduler, &rx, None);

        assert_eq!(scheduler.injector().idle, vec![true, false]);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn exits_when_senders_are_gone() {
        let mut scheduler = paused_scheduler();
        let (tx, rx) = mpsc::channel::<Command>();
        tx.send(Command::Toggle).unwrap();
        drop(tx);

        run(&mut scheduler, &rx, None);

        assert!(scheduler.injector().wiggles.is_empty());
        assert_eq!(scheduler.injector().idle, vec![true, false]);
    }

    #[test]
    fn start_paused_does_not_persist_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut scheduler = paused_scheduler();
        let (tx, rx) = mpsc::channel();
        tx.send(Command::SetInterval(60)).unwrap();
        tx.send(Command::Quit).unwrap();

        run(&mut scheduler, &rx, Some(&path));

        let saved = Settings::load(&path).unwrap();
        assert_eq!(saved.interval_secs, 60);
        assert!(saved.enabled);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn status_reports_state() {
        let scheduler = paused_scheduler();
        assert_eq!(status_line(&scheduler), "paused | every 30s | linear | 1px");
    }
}
