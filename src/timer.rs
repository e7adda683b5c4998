//! Timer tick loop driving the engine.

use crate::engine::{CompletionEvent, PomodoroEngine};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Message sent from the timer thread to the main thread.
#[derive(Debug, Clone)]
pub enum TimerMessage {
    /// Timer state has changed, the status line needs an update.
    StateChanged { status: String },
    /// An unattended phase transition happened, trigger notification/sound.
    Completed(CompletionEvent),
}

/// Runs the timer loop, ticking every second.
/// Sends messages to the main thread via the provided channel.
pub fn run_timer_loop(engine: Arc<Mutex<PomodoroEngine>>, tx: Sender<TimerMessage>) {
    loop {
        thread::sleep(Duration::from_secs(1));

        let message = {
            let mut engine = engine.lock().unwrap();

            // Check for day rollover
            engine.session.check_day_rollover();

            let (changed, completion) = engine.tick();

            if let Some(event) = completion {
                let _ = tx.send(TimerMessage::Completed(event));
            }

            if changed {
                let status = format_status(&engine);
                Some(TimerMessage::StateChanged { status })
            } else {
                None
            }
        };

        if let Some(msg) = message {
            let _ = tx.send(msg);
        }
    }
}

/// Formats the one-line status shown for the current timer state.
pub fn format_status(engine: &PomodoroEngine) -> String {
    let base = if let Some(secs) = engine.seconds_left() {
        let time = format_time(secs);
        if engine.is_paused() {
            format!("⏸ {time}")
        } else if engine.phase().is_break() {
            format!("☕ {time}")
        } else {
            format!("🍅 {time}")
        }
    } else {
        "🍅".to_string()
    };

    match engine.message() {
        Some(message) => format!("{base} · {message}"),
        None => base,
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::Database;
    use chrono::{TimeZone, Utc};

    fn test_engine() -> (PomodoroEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let db = Database::new_in_memory().unwrap();
        let engine = PomodoroEngine::with_database(db, clock.clone()).unwrap();
        (engine, clock)
    }

    #[test]
    fn test_format_status_idle() {
        let (engine, _clock) = test_engine();
        assert_eq!(format_status(&engine), "🍅");
    }

    #[test]
    fn test_format_status_running_work() {
        let (mut engine, clock) = test_engine();
        engine.start();
        clock.advance_secs(68);
        engine.tick();
        assert_eq!(format_status(&engine), "🍅 23:52");
    }

    #[test]
    fn test_format_status_paused() {
        let (mut engine, clock) = test_engine();
        engine.start();
        clock.advance_secs(10 * 60);
        engine.pause();
        assert_eq!(format_status(&engine), "⏸ 15:00");
    }

    #[test]
    fn test_format_status_running_break() {
        let (mut engine, _clock) = test_engine();
        engine.start();
        engine.skip();
        assert_eq!(format_status(&engine), "☕ 05:00");
    }

    #[test]
    fn test_format_status_waiting_to_start() {
        let (mut engine, clock) = test_engine();
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        clock.advance_secs(5 * 60);
        engine.tick();
        assert!(engine.is_waiting_to_start());
        assert_eq!(format_status(&engine), "🍅");
    }

    #[test]
    fn test_format_status_includes_message() {
        let (mut engine, _clock) = test_engine();
        engine.set_message("deep work");
        engine.start();
        assert_eq!(format_status(&engine), "🍅 25:00 · deep work");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(60), "01:00");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(3599), "59:59");
    }
}
