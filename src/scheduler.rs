//! Wiggle scheduler.
//!
//! `WiggleScheduler` owns the settings and a single repeating deadline.
//! It never reads the clock itself: every call that depends on time takes
//! `now`, which keeps the event loop in charge of waiting and lets tests
//! drive it with synthetic instants.
//!
//! States: Running (deadline armed) and Paused (no deadline). The stored
//! `enabled` setting only changes on an explicit `toggle`; a start-paused
//! launch leaves it as loaded.

use std::time::{Duration, Instant};

use crate::config::{self, ConfigError, Settings};
use crate::injector::Injector;
use crate::pattern::Pattern;

pub struct WiggleScheduler<I> {
    injector: I,
    settings: Settings,
    running: bool,
    next_fire: Option<Instant>,
}

impl<I: Injector> WiggleScheduler<I> {
    /// Builds the scheduler. `start_paused` forces Paused regardless of
    /// `settings.enabled`.
    pub fn new(
        settings: Settings,
        start_paused: bool,
        injector: I,
        now: Instant,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut scheduler = Self {
            injector,
            settings,
            running: settings.enabled && !start_paused,
            next_fire: None,
        };
        if scheduler.running {
            scheduler.arm(now);
            scheduler.apply_idle_suppression(true);
        }
        log::info!(
            "scheduler: {} every {}s, {} pattern, {}px",
            if scheduler.is_running() { "running" } else { "paused" },
            scheduler.settings.interval_secs,
            scheduler.settings.pattern,
            scheduler.settings.pixel_distance
        );
        Ok(scheduler)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current settings snapshot, as it should be persisted.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.interval_secs)
    }

    /// When the loop should next call `poll`; `None` while Paused.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_fire
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Flips Running and Paused and records the choice in `enabled`.
    /// Resuming waits a full interval before the first wiggle.
    pub fn toggle(&mut self, now: Instant) -> Settings {
        self.running = !self.running;
        self.settings.enabled = self.running;
        if self.running {
            self.arm(now);
            self.apply_idle_suppression(true);
            log::info!("scheduler: resumed");
        } else {
            self.next_fire = None;
            self.apply_idle_suppression(false);
            log::info!("scheduler: paused");
        }
        self.settings
    }

    /// Changes the period. While Running the next wiggle moves to
    /// `now + secs`.
    pub fn set_interval(&mut self, secs: u64, now: Instant) -> Result<Settings, ConfigError> {
        config::validate_interval(secs)?;
        self.settings.interval_secs = secs;
        if self.is_running() {
            self.arm(now);
        }
        log::info!("scheduler: interval set to {secs}s");
        Ok(self.settings)
    }

    /// Takes effect on the next wiggle.
    pub fn set_pattern(&mut self, pattern: Pattern) -> Settings {
        self.settings.pattern = pattern;
        log::info!("scheduler: pattern set to {pattern}");
        self.settings
    }

    /// Takes effect on the next wiggle.
    pub fn set_distance(&mut self, pixels: u32) -> Settings {
        self.settings.pixel_distance = pixels;
        log::info!("scheduler: distance set to {pixels}px");
        self.settings
    }

    /// Plays one wiggle with the current settings. No-op while Paused.
    pub fn on_tick(&mut self) {
        if !self.is_running() {
            return;
        }
        self.injector
            .inject(self.settings.pattern, self.settings.pixel_distance);
    }

    /// Fires `on_tick` if the deadline has passed and re-arms for
    /// `now + interval`. Returns whether a wiggle ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_fire {
            Some(deadline) if now >= deadline => {
                self.on_tick();
                self.arm(now);
                true
            }
            _ => false,
        }
    }

    /// Releases idle suppression before the process exits.
    pub fn shutdown(&mut self) {
        if self.is_running() {
            self.apply_idle_suppression(false);
        }
        self.next_fire = None;
    }

    fn arm(&mut self, now: Instant) {
        self.next_fire = now.checked_add(self.interval());
        if self.next_fire.is_none() {
            log::warn!(
                "scheduler: {}s from now is not representable, no wiggle scheduled",
                self.settings.interval_secs
            );
        }
    }

    fn apply_idle_suppression(&mut self, enabled: bool) {
        if self.settings.suppress_idle {
            self.injector.set_idle_suppression(enabled);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
