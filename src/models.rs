//! Data model for the focusbar timer core.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A timed segment of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    /// Stable tag used when persisting the phase.
    pub fn tag(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
        }
    }

    /// Parses a persisted tag. Unknown tags yield `None` so stale or corrupt
    /// values are treated as absent.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "work" => Some(Phase::Work),
            "short_break" => Some(Phase::ShortBreak),
            "long_break" => Some(Phase::LongBreak),
            _ => None,
        }
    }

    /// Returns true for either break variant.
    pub fn is_break(&self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short break",
            Phase::LongBreak => "Long break",
        };
        write!(f, "{label}")
    }
}

/// Whether the countdown is currently advancing, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// No countdown attached; a fresh cycle can be started.
    #[default]
    Idle,
    /// Counting down toward the phase end.
    Running,
    /// Countdown frozen by the user with remaining time captured.
    Paused,
    /// A break ran out; the next work session waits for explicit confirmation.
    WaitingToStart,
}

impl RunMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, RunMode::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RunMode::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, RunMode::Paused)
    }

    pub fn is_waiting_to_start(&self) -> bool {
        matches!(self, RunMode::WaitingToStart)
    }
}

/// User-configurable settings.
///
/// Durations are read at the moment a phase starts; changing them mid-phase
/// never alters an active countdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Duration of a work session in minutes.
    pub work_mins: u32,
    /// Duration of a short break in minutes.
    pub short_break_mins: u32,
    /// Duration of a long break in minutes.
    pub long_break_mins: u32,
    /// Extra break granted by "extend break", in minutes.
    pub extend_break_mins: u32,
    /// Work sessions before a long break.
    pub sessions_before_long_break: u32,
    /// Whether the host UI should blur the screen during breaks.
    pub blur_on_break: bool,
    /// Whether to play sounds on phase completion.
    pub sound_enabled: bool,
    /// Whether to show system notifications.
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_mins: 25,
            short_break_mins: 5,
            long_break_mins: 20,
            extend_break_mins: 5,
            sessions_before_long_break: 4,
            blur_on_break: true,
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// The configured full duration for a phase.
    pub fn duration_for(&self, phase: Phase) -> Duration {
        let mins = match phase {
            Phase::Work => self.work_mins,
            Phase::ShortBreak => self.short_break_mins,
            Phase::LongBreak => self.long_break_mins,
        };
        Duration::from_secs(u64::from(mins) * 60)
    }

    /// The duration of an extended break.
    pub fn extend_break_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.extend_break_mins) * 60)
    }
}

/// The persisted portion of the timer, saved after every state mutation and
/// reloaded on launch.
///
/// At most one of `phase_end_at` and `paused_remaining` is set: the end
/// instant while running, the captured remainder while paused, neither when
/// idle or waiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSnapshot {
    pub phase: Phase,
    /// Work sessions finished since the last long break.
    pub completed_sessions: u32,
    pub phase_end_at: Option<DateTime<Utc>>,
    pub paused_remaining: Option<Duration>,
}

impl TimerSnapshot {
    /// Snapshot of a detached timer (no countdown either way).
    pub fn detached(phase: Phase, completed_sessions: u32) -> Self {
        Self {
            phase,
            completed_sessions,
            phase_end_at: None,
            paused_remaining: None,
        }
    }
}

/// Daily focus tracking for the current day.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Work sessions completed today.
    pub sessions_today: u32,
    /// Total minutes of focus time today.
    pub focus_mins_today: u32,
    /// The date these counts are for.
    pub last_date: NaiveDate,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            sessions_today: 0,
            focus_mins_today: 0,
            last_date: Local::now().date_naive(),
        }
    }
}

impl Session {
    /// Creates an empty session for the given date.
    #[cfg(test)]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            sessions_today: 0,
            focus_mins_today: 0,
            last_date: date,
        }
    }

    /// Checks if the day has rolled over and resets daily counts if so.
    pub fn check_day_rollover(&mut self) {
        let today = Local::now().date_naive();
        if self.last_date != today {
            self.sessions_today = 0;
            self.focus_mins_today = 0;
            self.last_date = today;
        }
    }

    /// Records one finished work session.
    pub fn record_session(&mut self, duration_mins: u32) {
        self.check_day_rollover();
        self.sessions_today += 1;
        self.focus_mins_today += duration_mins;
    }

    /// Resets today's counts.
    pub fn reset_today(&mut self) {
        self.sessions_today = 0;
        self.focus_mins_today = 0;
    }
}

/// One persisted per-date row of daily statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub completed_sessions: u32,
    pub total_focus_minutes: u32,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            completed_sessions: 0,
            total_focus_minutes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_tag_roundtrip() {
        for phase in [Phase::Work, Phase::ShortBreak, Phase::LongBreak] {
            assert_eq!(Phase::from_tag(phase.tag()), Some(phase));
        }
    }

    #[test]
    fn test_phase_unknown_tag_is_none() {
        assert_eq!(Phase::from_tag(""), None);
        assert_eq!(Phase::from_tag("nap"), None);
        assert_eq!(Phase::from_tag("WORK"), None);
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Work.to_string(), "Work");
        assert_eq!(Phase::ShortBreak.to_string(), "Short break");
        assert_eq!(Phase::LongBreak.to_string(), "Long break");
    }

    #[test]
    fn test_phase_is_break() {
        assert!(!Phase::Work.is_break());
        assert!(Phase::ShortBreak.is_break());
        assert!(Phase::LongBreak.is_break());
    }

    #[test]
    fn test_run_mode_predicates() {
        assert!(RunMode::Idle.is_idle());
        assert!(RunMode::Running.is_running());
        assert!(RunMode::Paused.is_paused());
        assert!(RunMode::WaitingToStart.is_waiting_to_start());

        assert!(!RunMode::Running.is_idle());
        assert!(!RunMode::Paused.is_running());
        assert!(!RunMode::WaitingToStart.is_paused());
        assert!(!RunMode::Idle.is_waiting_to_start());
    }

    #[test]
    fn test_run_mode_default_is_idle() {
        assert_eq!(RunMode::default(), RunMode::Idle);
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.work_mins, 25);
        assert_eq!(settings.short_break_mins, 5);
        assert_eq!(settings.long_break_mins, 20);
        assert_eq!(settings.extend_break_mins, 5);
        assert_eq!(settings.sessions_before_long_break, 4);
        assert!(settings.blur_on_break);
        assert!(settings.sound_enabled);
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn test_settings_duration_for() {
        let settings = Settings::default();
        assert_eq!(settings.duration_for(Phase::Work).as_secs(), 1500);
        assert_eq!(settings.duration_for(Phase::ShortBreak).as_secs(), 300);
        assert_eq!(settings.duration_for(Phase::LongBreak).as_secs(), 1200);
        assert_eq!(settings.extend_break_duration().as_secs(), 300);
    }

    #[test]
    fn test_snapshot_detached() {
        let snapshot = TimerSnapshot::detached(Phase::ShortBreak, 2);
        assert_eq!(snapshot.phase, Phase::ShortBreak);
        assert_eq!(snapshot.completed_sessions, 2);
        assert!(snapshot.phase_end_at.is_none());
        assert!(snapshot.paused_remaining.is_none());
    }

    #[test]
    fn test_session_record() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut session = Session::new(date);

        // Pin to today so check_day_rollover doesn't reset
        session.last_date = Local::now().date_naive();

        session.record_session(25);
        assert_eq!(session.sessions_today, 1);
        assert_eq!(session.focus_mins_today, 25);

        session.record_session(30);
        assert_eq!(session.sessions_today, 2);
        assert_eq!(session.focus_mins_today, 55);
    }

    #[test]
    fn test_session_rollover_resets_counts() {
        let mut session = Session {
            sessions_today: 6,
            focus_mins_today: 150,
            last_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        session.check_day_rollover();
        assert_eq!(session.sessions_today, 0);
        assert_eq!(session.focus_mins_today, 0);
        assert_eq!(session.last_date, Local::now().date_naive());
    }

    #[test]
    fn test_session_reset_today() {
        let mut session = Session::default();
        session.sessions_today = 5;
        session.focus_mins_today = 125;

        session.reset_today();

        assert_eq!(session.sessions_today, 0);
        assert_eq!(session.focus_mins_today, 0);
    }

    #[test]
    fn test_daily_stats_new() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let stats = DailyStats::new(date);
        assert_eq!(stats.date, date);
        assert_eq!(stats.completed_sessions, 0);
        assert_eq!(stats.total_focus_minutes, 0);
    }
}
