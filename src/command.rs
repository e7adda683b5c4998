//! Text command handling for the interactive shell.

use crate::engine::PomodoroEngine;
use crate::models::Settings;
use crate::timer::format_status;

const HELP: &str = "\
Commands:
  start           start a fresh pomodoro cycle
  resume          reattach to the countdown from a previous run
  pause           pause the countdown
  unpause         continue a paused countdown
  stop            abandon the cycle and go idle
  skip            end the current phase early
  next            confirm the next work session after a break
  extend          add extra break time after a break ended
  msg [text]      annotate the session; without text, clear it
  status          print the current status line
  stats           print today's totals
  reset-stats     reset today's totals
  settings        print the current settings
  set <name> <n>  set work/short/long/extend minutes or sessions
  sound on|off    toggle the completion chime
  notify on|off   toggle desktop notifications
  blur on|off     toggle screen dimming during breaks
  quit            exit";

/// Result of handling one command line.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Command handled, nothing to show.
    Continue,
    /// State changed, the status line should be reprinted.
    StateChanged,
    /// Text to print back to the user.
    Reply(String),
    /// User requested quit.
    Quit,
}

/// Handles one line of input and updates the engine accordingly.
pub fn handle_command(engine: &mut PomodoroEngine, line: &str) -> CommandOutcome {
    let line = line.trim();
    if line.is_empty() {
        return CommandOutcome::Continue;
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "start" => {
            engine.start();
            CommandOutcome::StateChanged
        }
        "resume" => {
            engine.resume();
            if engine.is_running() || engine.is_paused() {
                CommandOutcome::StateChanged
            } else {
                CommandOutcome::Reply("No previous session to resume.".to_string())
            }
        }
        "pause" => {
            engine.pause();
            CommandOutcome::StateChanged
        }
        "unpause" => {
            engine.unpause();
            CommandOutcome::StateChanged
        }
        "stop" => {
            engine.stop();
            CommandOutcome::StateChanged
        }
        "skip" => {
            engine.skip();
            CommandOutcome::StateChanged
        }
        "next" => {
            engine.start_next_work();
            CommandOutcome::StateChanged
        }
        "extend" => {
            engine.extend_break();
            CommandOutcome::StateChanged
        }
        "msg" => {
            engine.set_message(rest);
            CommandOutcome::StateChanged
        }
        "status" => CommandOutcome::Reply(format_status(engine)),
        "stats" => {
            let sessions = engine.session.sessions_today;
            let noun = if sessions == 1 { "session" } else { "sessions" };
            CommandOutcome::Reply(format!(
                "{sessions} {noun} · {} min focused today",
                engine.session.focus_mins_today
            ))
        }
        "reset-stats" => {
            engine.reset_today();
            CommandOutcome::Reply("Daily stats reset.".to_string())
        }
        "settings" => CommandOutcome::Reply(format_settings(&engine.settings)),
        "set" => handle_set(engine, rest),
        "sound" | "notify" | "blur" => handle_toggle(engine, command, rest),
        "help" => CommandOutcome::Reply(HELP.to_string()),
        "quit" | "exit" => CommandOutcome::Quit,
        _ => CommandOutcome::Reply(format!("Unknown command: {command}. Try 'help'.")),
    }
}

/// Handles `set <name> <value>` for the duration and threshold settings.
fn handle_set(engine: &mut PomodoroEngine, args: &str) -> CommandOutcome {
    let usage = || {
        CommandOutcome::Reply(
            "Usage: set <work|short|long|extend|sessions> <positive number>".to_string(),
        )
    };
    let Some((name, value)) = args.split_once(char::is_whitespace) else {
        return usage();
    };
    let Ok(value) = value.trim().parse::<u32>() else {
        return usage();
    };
    if value == 0 {
        return usage();
    }

    match name {
        "work" => engine.update_setting(|s| s.work_mins = value),
        "short" => engine.update_setting(|s| s.short_break_mins = value),
        "long" => engine.update_setting(|s| s.long_break_mins = value),
        "extend" => engine.update_setting(|s| s.extend_break_mins = value),
        "sessions" => engine.update_setting(|s| s.sessions_before_long_break = value),
        _ => return usage(),
    }
    CommandOutcome::Reply(format!("Set {name} to {value}."))
}

fn handle_toggle(engine: &mut PomodoroEngine, name: &str, value: &str) -> CommandOutcome {
    let enabled = match value {
        "on" => true,
        "off" => false,
        _ => return CommandOutcome::Reply(format!("Usage: {name} on|off")),
    };
    match name {
        "sound" => engine.update_setting(|s| s.sound_enabled = enabled),
        "notify" => engine.update_setting(|s| s.notifications_enabled = enabled),
        "blur" => engine.update_setting(|s| s.blur_on_break = enabled),
        _ => return CommandOutcome::Reply(format!("Unknown toggle: {name}")),
    }
    CommandOutcome::Reply(format!("{name} {value}"))
}

fn format_settings(settings: &Settings) -> String {
    format!(
        "work {}m · short break {}m · long break {}m · extend {}m · {} sessions before long break\n\
         sound {} · notifications {} · blur on break {}",
        settings.work_mins,
        settings.short_break_mins,
        settings.long_break_mins,
        settings.extend_break_mins,
        settings.sessions_before_long_break,
        on_off(settings.sound_enabled),
        on_off(settings.notifications_enabled),
        on_off(settings.blur_on_break),
    )
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::Phase;
    use crate::persistence::Database;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn test_engine() -> (PomodoroEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let db = Database::new_in_memory().unwrap();
        let engine = PomodoroEngine::with_database(db, clock.clone()).unwrap();
        (engine, clock)
    }

    #[test]
    fn test_start_command() {
        let (mut engine, _clock) = test_engine();
        let outcome = handle_command(&mut engine, "start");
        assert_eq!(outcome, CommandOutcome::StateChanged);
        assert!(engine.is_running());
    }

    #[test]
    fn test_empty_line_does_nothing() {
        let (mut engine, _clock) = test_engine();
        assert_eq!(handle_command(&mut engine, "   "), CommandOutcome::Continue);
        assert!(engine.run_mode().is_idle());
    }

    #[test]
    fn test_unknown_command() {
        let (mut engine, _clock) = test_engine();
        let outcome = handle_command(&mut engine, "frobnicate");
        assert!(matches!(outcome, CommandOutcome::Reply(r) if r.contains("Unknown command")));
    }

    #[test]
    fn test_quit_command() {
        let (mut engine, _clock) = test_engine();
        assert_eq!(handle_command(&mut engine, "quit"), CommandOutcome::Quit);
        assert_eq!(handle_command(&mut engine, "exit"), CommandOutcome::Quit);
    }

    #[test]
    fn test_msg_sets_and_clears() {
        let (mut engine, _clock) = test_engine();
        handle_command(&mut engine, "msg finish the draft");
        assert_eq!(engine.message(), Some("finish the draft"));

        handle_command(&mut engine, "msg");
        assert_eq!(engine.message(), None);
    }

    #[test]
    fn test_resume_without_session_replies() {
        let (mut engine, _clock) = test_engine();
        let outcome = handle_command(&mut engine, "resume");
        assert!(matches!(outcome, CommandOutcome::Reply(r) if r.contains("No previous session")));
    }

    #[test]
    fn test_pause_and_unpause_commands() {
        let (mut engine, clock) = test_engine();
        handle_command(&mut engine, "start");
        clock.advance_secs(5);
        handle_command(&mut engine, "pause");
        assert!(engine.is_paused());
        handle_command(&mut engine, "unpause");
        assert!(engine.is_running());
    }

    #[test]
    fn test_next_and_extend_from_waiting() {
        let (mut engine, clock) = test_engine();
        handle_command(&mut engine, "start");
        clock.advance_secs(25 * 60);
        engine.tick();
        clock.advance_secs(5 * 60);
        engine.tick();
        assert!(engine.is_waiting_to_start());

        handle_command(&mut engine, "extend");
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert!(engine.is_running());

        clock.advance_secs(5 * 60);
        engine.tick();
        handle_command(&mut engine, "next");
        assert_eq!(engine.phase(), Phase::Work);
        assert!(engine.is_running());
    }

    #[test]
    fn test_set_updates_and_persists() {
        let (mut engine, _clock) = test_engine();
        let outcome = handle_command(&mut engine, "set work 50");
        assert_eq!(outcome, CommandOutcome::Reply("Set work to 50.".to_string()));
        assert_eq!(engine.settings.work_mins, 50);
        assert_eq!(engine.db.load_settings().unwrap().work_mins, 50);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let (mut engine, _clock) = test_engine();
        for line in ["set work 0", "set work ten", "set nap 5", "set work"] {
            let outcome = handle_command(&mut engine, line);
            assert!(matches!(outcome, CommandOutcome::Reply(r) if r.starts_with("Usage")));
        }
        assert_eq!(engine.settings.work_mins, 25);
    }

    #[test]
    fn test_toggles() {
        let (mut engine, _clock) = test_engine();
        handle_command(&mut engine, "sound off");
        assert!(!engine.settings.sound_enabled);
        handle_command(&mut engine, "notify off");
        assert!(!engine.settings.notifications_enabled);
        handle_command(&mut engine, "blur off");
        assert!(!engine.settings.blur_on_break);
        handle_command(&mut engine, "sound on");
        assert!(engine.settings.sound_enabled);
    }

    #[test]
    fn test_status_reports_current_state() {
        let (mut engine, _clock) = test_engine();
        handle_command(&mut engine, "start");
        let outcome = handle_command(&mut engine, "status");
        assert_eq!(outcome, CommandOutcome::Reply("🍅 25:00".to_string()));
    }

    #[test]
    fn test_stats_reports_today() {
        let (mut engine, _clock) = test_engine();
        handle_command(&mut engine, "start");
        handle_command(&mut engine, "skip");
        let outcome = handle_command(&mut engine, "stats");
        assert_eq!(
            outcome,
            CommandOutcome::Reply("1 session · 25 min focused today".to_string())
        );
    }
}
