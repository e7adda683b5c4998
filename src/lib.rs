//! Focusbar - a Pomodoro focus timer core with a small interactive shell
//!
//! The heart of the crate is [`engine::PomodoroEngine`], a phase state
//! machine that counts down work and break phases against an injectable
//! clock, persists itself through SQLite and reports unattended phase
//! transitions as events. Everything around it (command parsing, the tick
//! loop, notifications, chimes) is thin glue over that engine.

pub mod audio;
pub mod clock;
pub mod command;
pub mod engine;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod timer;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{CompletionEvent, EngineError, PomodoroEngine};
pub use models::{Phase, RunMode, Settings};
pub use persistence::Database;
