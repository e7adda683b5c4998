//! The Pomodoro phase state machine.
//!
//! Owns the countdown, the work/break cycle and pause/skip/extend handling.
//! Time comes from an injected [`Clock`] and every mutation is mirrored to
//! the [`Database`], so the machine can be driven deterministically in tests
//! and survives process restarts. The countdown itself advances through
//! [`PomodoroEngine::tick`], which an external scheduler calls about once a
//! second.

use crate::clock::{Clock, SystemClock};
use crate::models::{Phase, RunMode, Session, Settings, TimerSnapshot};
use crate::persistence::{Database, DatabaseError};
use crate::timer::format_time;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Events produced by unattended phase transitions.
///
/// `skip` and the other user commands never produce one; the events exist so
/// the shell can notify about transitions the user did not trigger themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionEvent {
    /// A work phase ran out and the given break phase has started.
    WorkComplete { count: u32, next: Phase },
    /// A break phase ran out; the machine now waits for confirmation.
    BreakComplete,
}

/// The timer core.
///
/// All operations are synchronous and defensive: calling one from a state it
/// does not apply to is a no-op, never an error.
pub struct PomodoroEngine {
    phase: Phase,
    run_mode: RunMode,
    completed_sessions: u32,
    phase_end_at: Option<DateTime<Utc>>,
    paused_remaining: Option<Duration>,
    message: Option<String>,
    pub settings: Settings,
    pub session: Session,
    pub db: Database,
    clock: Arc<dyn Clock>,
}

impl PomodoroEngine {
    /// Creates an engine backed by the default database and the system clock.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_database(Database::new()?, Arc::new(SystemClock))
    }

    /// Creates an engine with an explicit database and clock.
    ///
    /// Phase, session counter and message are rehydrated from the store right
    /// away. A persisted countdown is not: the engine comes up `Idle` and
    /// only reattaches when [`resume`](Self::resume) is called, so a stale
    /// session is never silently running in the background.
    pub fn with_database(db: Database, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        let settings = db.load_settings()?;
        let session = db.load_today_session()?;
        let message = db.load_message()?;
        let (phase, completed_sessions) = match db.load_timer()? {
            Some(snapshot) => (snapshot.phase, snapshot.completed_sessions),
            None => (Phase::Work, 0),
        };

        Ok(Self {
            phase,
            run_mode: RunMode::Idle,
            completed_sessions,
            phase_end_at: None,
            paused_remaining: None,
            message,
            settings,
            session,
            db,
            clock,
        })
    }

    // --- commands ---

    /// Starts a fresh cycle: counter back to zero, full work phase running.
    /// Valid from any state; an in-progress cycle is overwritten.
    pub fn start(&mut self) {
        self.completed_sessions = 0;
        self.begin_phase(Phase::Work);
    }

    /// Reattaches to a countdown persisted by a previous run.
    ///
    /// A paused remainder is restored as `Paused`; a future end instant is
    /// restored as `Running`. An end instant already in the past is dropped
    /// from the store without replaying the transitions that would have
    /// happened in the meantime, leaving the engine `Idle` for a fresh
    /// `start`. No-op unless currently `Idle`.
    pub fn resume(&mut self) {
        if !self.run_mode.is_idle() {
            return;
        }
        let snapshot = match self.db.load_timer() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not read persisted timer: {e}");
                return;
            }
        };
        self.phase = snapshot.phase;
        self.completed_sessions = snapshot.completed_sessions;

        if let Some(remaining) = snapshot.paused_remaining {
            self.paused_remaining = Some(remaining);
            self.phase_end_at = None;
            self.run_mode = RunMode::Paused;
            return;
        }
        let Some(end) = snapshot.phase_end_at else {
            return;
        };
        if end > self.clock.now() {
            self.phase_end_at = Some(end);
            self.run_mode = RunMode::Running;
        } else {
            // Stale countdown from before the process was down.
            debug!("Discarding stale persisted countdown (ended {end})");
            self.phase_end_at = None;
            self.persist_timer();
        }
    }

    /// Freezes the countdown, capturing the remaining time. Valid from any
    /// running phase with time left; no-op otherwise, including when already
    /// paused.
    pub fn pause(&mut self) {
        if !self.run_mode.is_running() {
            return;
        }
        let Some(remaining) = self.remaining_duration().filter(|r| *r > Duration::ZERO) else {
            return;
        };
        self.paused_remaining = Some(remaining);
        self.phase_end_at = None;
        self.run_mode = RunMode::Paused;
        self.persist_timer();
    }

    /// Thaws a paused countdown by re-anchoring the captured remainder to the
    /// current time. No-op unless paused.
    pub fn unpause(&mut self) {
        if !self.run_mode.is_paused() {
            return;
        }
        let Some(remaining) = self.paused_remaining.filter(|r| *r > Duration::ZERO) else {
            return;
        };
        self.phase_end_at = Some(self.end_after(remaining));
        self.paused_remaining = None;
        self.run_mode = RunMode::Running;
        self.persist_timer();
    }

    /// Abandons the cycle: back to `Idle` with the persisted timer cleared.
    /// The message is kept; it has its own lifecycle.
    pub fn stop(&mut self) {
        self.phase = Phase::Work;
        self.completed_sessions = 0;
        self.phase_end_at = None;
        self.paused_remaining = None;
        self.run_mode = RunMode::Idle;
        if let Err(e) = self.db.clear_timer() {
            warn!("Could not clear persisted timer: {e}");
        }
    }

    /// Ends the current phase early and moves straight into the next one,
    /// following the same transition table as expiry but without events and
    /// without stopping at the confirmation step. Valid from `Running` or
    /// `Paused`.
    pub fn skip(&mut self) {
        if !self.run_mode.is_running() && !self.run_mode.is_paused() {
            return;
        }
        match self.phase {
            Phase::Work => {
                let next = self.complete_work();
                self.begin_phase(next);
            }
            Phase::ShortBreak | Phase::LongBreak => {
                self.complete_break();
                self.begin_phase(Phase::Work);
            }
        }
    }

    /// Confirms the next work session after a break ran out. No-op unless
    /// waiting for that confirmation.
    pub fn start_next_work(&mut self) {
        if !self.run_mode.is_waiting_to_start() {
            return;
        }
        self.begin_phase(Phase::Work);
    }

    /// Adds extra break time after a break already ran out. The new countdown
    /// is a short break of the configured extend duration, whatever the prior
    /// break was. No-op unless waiting for confirmation.
    pub fn extend_break(&mut self) {
        if !self.run_mode.is_waiting_to_start() {
            return;
        }
        self.begin_countdown(Phase::ShortBreak, self.settings.extend_break_duration());
    }

    /// Sets or clears the session annotation, independent of the timer.
    /// Whitespace is trimmed; an empty result clears the message.
    pub fn set_message(&mut self, text: &str) {
        let trimmed = text.trim();
        self.message = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        if let Err(e) = self.db.save_message(self.message.as_deref()) {
            warn!("Could not persist message: {e}");
        }
    }

    /// Updates a setting and saves the whole settings blob.
    pub fn update_setting<F>(&mut self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        updater(&mut self.settings);
        if let Err(e) = self.db.save_settings(&self.settings) {
            warn!("Could not persist settings: {e}");
        }
    }

    /// Resets today's statistics.
    pub fn reset_today(&mut self) {
        self.session.reset_today();
        if let Err(e) = self.db.reset_today() {
            warn!("Could not reset daily stats: {e}");
        }
    }

    // --- tick ---

    /// Advances the machine by consulting the clock once.
    ///
    /// Called by the external scheduler about once a second, but tolerant of
    /// arbitrary gaps (system sleep, a wedged scheduler): remaining time is
    /// recomputed from the absolute end instant, never decremented. Returns
    /// whether the visible state changed and, on an unattended phase
    /// transition, the event describing it.
    pub fn tick(&mut self) -> (bool, Option<CompletionEvent>) {
        if !self.run_mode.is_running() {
            return (false, None);
        }
        let Some(end) = self.phase_end_at else {
            // Running without an end instant should be unreachable; treat it
            // as an external stop.
            self.run_mode = RunMode::Idle;
            return (true, None);
        };
        if self.seconds_until(end) > 0 {
            return (true, None);
        }
        let event = self.advance_phase();
        (true, Some(event))
    }

    // --- observables ---

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Work sessions finished since the last long break.
    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.run_mode.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.run_mode.is_paused()
    }

    pub fn is_waiting_to_start(&self) -> bool {
        self.run_mode.is_waiting_to_start()
    }

    /// Whole seconds left on the countdown, rounded up so the display never
    /// skips a value when a tick lands a few milliseconds late. `None` while
    /// idle or waiting.
    pub fn seconds_left(&self) -> Option<u32> {
        match self.run_mode {
            RunMode::Running => {
                let end = self.phase_end_at?;
                Some(self.seconds_until(end).max(0) as u32)
            }
            RunMode::Paused => {
                let remaining = self.paused_remaining?;
                Some(((remaining.as_millis() + 999) / 1000) as u32)
            }
            RunMode::Idle | RunMode::WaitingToStart => None,
        }
    }

    /// `MM:SS` form of [`seconds_left`](Self::seconds_left).
    pub fn formatted_time(&self) -> Option<String> {
        self.seconds_left().map(format_time)
    }

    /// Whether the store holds a countdown from a previous run that still has
    /// time on it, i.e. whether offering `resume` makes sense.
    pub fn has_previous_session(&self) -> bool {
        let snapshot = match self.db.load_timer() {
            Ok(Some(snapshot)) => snapshot,
            _ => return false,
        };
        if snapshot.paused_remaining.is_some() {
            return true;
        }
        matches!(snapshot.phase_end_at, Some(end) if end > self.clock.now())
    }

    // --- internals ---

    /// Starts the given phase with its configured duration, read fresh from
    /// the settings at this instant.
    fn begin_phase(&mut self, phase: Phase) {
        self.begin_countdown(phase, self.settings.duration_for(phase));
    }

    fn begin_countdown(&mut self, phase: Phase, duration: Duration) {
        self.phase = phase;
        self.phase_end_at = Some(self.end_after(duration));
        self.paused_remaining = None;
        self.run_mode = RunMode::Running;
        self.persist_timer();
    }

    fn end_after(&self, duration: Duration) -> DateTime<Utc> {
        let length = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        self.clock.now() + length
    }

    /// Books the finished work session and picks the break that follows it.
    fn complete_work(&mut self) -> Phase {
        self.completed_sessions += 1;
        self.session.record_session(self.settings.work_mins);
        if let Err(e) = self.db.save_session(&self.session) {
            warn!("Could not save daily stats: {e}");
        }
        if self.completed_sessions < self.settings.sessions_before_long_break {
            Phase::ShortBreak
        } else {
            Phase::LongBreak
        }
    }

    /// Ends a break: phase flips to `Work` and a finished long break resets
    /// the session counter.
    fn complete_break(&mut self) {
        if self.phase == Phase::LongBreak {
            self.completed_sessions = 0;
        }
        self.phase = Phase::Work;
    }

    /// Unattended expiry. Work rolls straight into its break; a break parks
    /// the machine at the confirmation step instead of starting work on its
    /// own.
    fn advance_phase(&mut self) -> CompletionEvent {
        match self.phase {
            Phase::Work => {
                let next = self.complete_work();
                debug!("Work phase expired; starting {next}");
                self.begin_phase(next);
                CompletionEvent::WorkComplete {
                    count: self.session.sessions_today,
                    next,
                }
            }
            Phase::ShortBreak | Phase::LongBreak => {
                debug!("{} expired; waiting for confirmation", self.phase);
                self.complete_break();
                self.phase_end_at = None;
                self.paused_remaining = None;
                self.run_mode = RunMode::WaitingToStart;
                self.persist_timer();
                CompletionEvent::BreakComplete
            }
        }
    }

    fn remaining_duration(&self) -> Option<Duration> {
        match self.run_mode {
            RunMode::Running => {
                let end = self.phase_end_at?;
                (end - self.clock.now()).to_std().ok()
            }
            RunMode::Paused => self.paused_remaining,
            RunMode::Idle | RunMode::WaitingToStart => None,
        }
    }

    /// Whole seconds until `end`, rounded up.
    fn seconds_until(&self, end: DateTime<Utc>) -> i64 {
        let millis = (end - self.clock.now()).num_milliseconds();
        (millis + 999).div_euclid(1000)
    }

    fn persist_timer(&self) {
        let snapshot = TimerSnapshot {
            phase: self.phase,
            completed_sessions: self.completed_sessions,
            phase_end_at: self.phase_end_at,
            paused_remaining: self.paused_remaining,
        };
        if let Err(e) = self.db.save_timer(&snapshot) {
            warn!("Could not persist timer state: {e}");
        }
    }
}
