//! Focusbar - a Pomodoro focus timer with an interactive shell.
//!
//! The timer core lives in the library; this binary wires it to a terminal:
//! commands come in on stdin, the countdown is rendered as a one-line status,
//! and unattended phase transitions trigger notifications and chimes.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use focusbar::audio::AudioPlayer;
use focusbar::command::{self, CommandOutcome};
use focusbar::engine::{CompletionEvent, PomodoroEngine};
use focusbar::models::Phase;
use focusbar::notifications;
use focusbar::timer::{self, TimerMessage};
use log::info;

/// Terminal front end around the shared engine.
struct Shell {
    engine: Arc<Mutex<PomodoroEngine>>,
    audio: Option<AudioPlayer>,
}

impl Shell {
    fn new(engine: Arc<Mutex<PomodoroEngine>>) -> Self {
        // Audio is created on the main thread to avoid Send issues
        let audio = AudioPlayer::new().ok();
        Self { engine, audio }
    }

    /// Redraws the status line in place.
    fn show_status(&self, status: &str) {
        print!("\r{status}        ");
        let _ = io::stdout().flush();
    }

    /// Prints a full line, first breaking out of the in-place status line.
    fn print_line(&self, text: &str) {
        println!();
        println!("{text}");
    }

    fn print_current_status(&self) {
        let engine = self.engine.lock().unwrap();
        self.print_line(&timer::format_status(&engine));
    }

    fn handle_completion(&self, event: CompletionEvent) {
        let engine = self.engine.lock().unwrap();

        // Play sound if enabled
        if engine.settings.sound_enabled {
            if let Some(ref audio) = self.audio {
                match event {
                    CompletionEvent::WorkComplete { .. } => audio.play_break_chime(),
                    CompletionEvent::BreakComplete => audio.play_work_chime(),
                }
            }
        }

        // Show notification if enabled
        if engine.settings.notifications_enabled {
            match event {
                CompletionEvent::WorkComplete { count, next } => {
                    if next == Phase::LongBreak {
                        notifications::notify_long_break_start(engine.settings.long_break_mins);
                    } else {
                        notifications::notify_work_complete(
                            count,
                            engine.message().map(str::to_string),
                        );
                    }
                }
                CompletionEvent::BreakComplete => {
                    notifications::notify_break_complete();
                }
            }
        }

        match event {
            CompletionEvent::WorkComplete { count, next } => {
                let label = if next == Phase::LongBreak {
                    "long"
                } else {
                    "short"
                };
                self.print_line(&format!(
                    "Session {count} complete! Time for a {label} break."
                ));
            }
            CompletionEvent::BreakComplete => {
                self.print_line(
                    "Break over! Type 'next' to start working, or 'extend' for more break time.",
                );
            }
        }
    }

    fn drain_timer_messages(&self, timer_rx: &Receiver<TimerMessage>) {
        while let Ok(msg) = timer_rx.try_recv() {
            match msg {
                TimerMessage::StateChanged { status } => self.show_status(&status),
                TimerMessage::Completed(event) => self.handle_completion(event),
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    info!("Starting focusbar");

    let engine = Arc::new(Mutex::new(PomodoroEngine::new()?));

    // Spawn timer tick thread
    let (timer_tx, timer_rx) = mpsc::channel();
    let engine_clone = Arc::clone(&engine);
    thread::spawn(move || {
        timer::run_timer_loop(engine_clone, timer_tx);
    });

    // Spawn stdin reader thread
    let (input_tx, input_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });

    let shell = Shell::new(Arc::clone(&engine));

    println!("focusbar - type 'help' for commands");
    {
        let engine = engine.lock().unwrap();
        if engine.has_previous_session() {
            println!("A previous session is still on the clock. Type 'resume' to continue it.");
        }
    }

    loop {
        shell.drain_timer_messages(&timer_rx);

        // Block briefly for the next command so timer messages keep flowing.
        match input_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(line) => {
                let outcome = {
                    let mut engine = engine.lock().unwrap();
                    command::handle_command(&mut engine, &line)
                };
                match outcome {
                    CommandOutcome::Continue => {}
                    CommandOutcome::StateChanged => shell.print_current_status(),
                    CommandOutcome::Reply(text) => shell.print_line(&text),
                    CommandOutcome::Quit => break,
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    Ok(())
}
