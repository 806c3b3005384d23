//! Input injection.
//!
//! `InputInjector` plays a pattern back through a `PointerExecutor` and
//! toggles the OS idle-suppression flag. Every OS failure is swallowed here:
//! the next scheduled wiggle is the retry.

use std::thread;

use crate::pattern::Pattern;
use crate::platform::PointerExecutor;

/// What the scheduler needs from an injector.
pub trait Injector {
    /// Plays one wiggle of `pattern` with `distance`-pixel steps.
    fn inject(&mut self, pattern: Pattern, distance: u32);

    /// Acquires or releases the idle-suppression flag. Best-effort.
    fn set_idle_suppression(&mut self, enabled: bool);

    /// Wiggles in a row with at least one failed step.
    fn consecutive_failures(&self) -> u32 {
        0
    }
}

/// Injector backed by the platform pointer executor.
pub struct InputInjector {
    executor: Box<dyn PointerExecutor>,
    consecutive_failures: u32,
}

impl InputInjector {
    pub fn new(executor: Box<dyn PointerExecutor>) -> Self {
        Self {
            executor,
            consecutive_failures: 0,
        }
    }
}

impl Injector for InputInjector {
    fn inject(&mut self, pattern: Pattern, distance: u32) {
        let displacement = pattern.displacement(distance);
        debug_assert_eq!(displacement.net(), (0, 0));
        let started = std::time::Instant::now();
        let mut failed = false;

        for &(dx, dy) in &displacement.steps {
            if let Err(e) = self.executor.move_relative(dx, dy) {
                log::debug!("injector: step ({dx}, {dy}) failed: {e}");
                failed = true;
            }
            thread::sleep(displacement.step_delay);
        }

        if failed {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 0;
        }
        log::debug!(
            "injector: {pattern} wiggle of {distance}px done in {:.0?} (planned {:.0?})",
            started.elapsed(),
            displacement.duration()
        );
    }

    fn set_idle_suppression(&mut self, enabled: bool) {
        if let Err(e) = self.executor.set_idle_suppression(enabled) {
            log::debug!("injector: idle suppression {enabled} failed: {e}");
        }
    }

    /// Reset by a wiggle with no failed step.
    fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        moves: Vec<(i32, i32)>,
        idle: Vec<bool>,
    }

    /// Records calls; fails every call when `fail` is set.
    struct FakeExecutor {
        log: Arc<Mutex<Log>>,
        fail: bool,
    }

    impl PointerExecutor for FakeExecutor {
        fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PlatformError> {
            self.log.lock().unwrap().moves.push((dx, dy));
            if self.fail {
                return Err(PlatformError::Other("test".into()));
            }
            Ok(())
        }

        fn set_idle_suppression(&mut self, enabled: bool) -> Result<(), PlatformError> {
            self.log.lock().unwrap().idle.push(enabled);
            if self.fail {
                return Err(PlatformError::Other("test".into()));
            }
            Ok(())
        }
    }

    fn injector(fail: bool) -> (InputInjector, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let executor = FakeExecutor {
            log: Arc::clone(&log),
            fail,
        };
        (InputInjector::new(Box::new(executor)), log)
    }

    #[test]
    fn linear_submits_both_steps_in_order() {
        let (mut inj, log) = injector(false);
        inj.inject(Pattern::Linear, 3);
        assert_eq!(log.lock().unwrap().moves, vec![(3, 0), (-3, 0)]);
    }

    #[test]
    fn circular_submits_diamond() {
        let (mut inj, log) = injector(false);
        inj.inject(Pattern::Circular, 2);
        assert_eq!(
            log.lock().unwrap().moves,
            vec![(2, 0), (0, 2), (-2, 0), (0, -2)]
        );
    }

    #[test]
    fn zero_distance_still_submits_steps() {
        let (mut inj, log) = injector(false);
        inj.inject(Pattern::Linear, 0);
        assert_eq!(log.lock().unwrap().moves, vec![(0, 0), (0, 0)]);
    }

    #[test]
    fn failures_are_swallowed_and_counted() {
        let (mut inj, log) = injector(true);
        inj.inject(Pattern::Linear, 1);
        inj.inject(Pattern::Linear, 1);
        inj.set_idle_suppression(true);

        // Every step was still attempted.
        assert_eq!(log.lock().unwrap().moves.len(), 4);
        assert_eq!(log.lock().unwrap().idle, vec![true]);
        assert_eq!(inj.consecutive_failures(), 2);
    }

    #[test]
    fn clean_wiggle_resets_failure_count() {
        let (mut inj, _log) = injector(false);
        inj.consecutive_failures = 5;
        inj.inject(Pattern::Linear, 1);
        assert_eq!(inj.consecutive_failures(), 0);
    }
}
