use crate::models::{DailyStats, Phase, Session, Settings, TimerSnapshot};
use chrono::{DateTime, Local, NaiveDate};
use log::warn;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine data directory")]
    DirectoryCreation,
}

const KEY_PHASE: &str = "phase";
const KEY_COMPLETED_SESSIONS: &str = "completed_sessions";
const KEY_PHASE_END_AT: &str = "phase_end_at";
const KEY_PAUSED_REMAINING: &str = "paused_remaining";
const KEY_MESSAGE: &str = "message";

/// SQLite-backed store for settings, timer state and daily statistics.
///
/// Every write commits before the call returns, so state recorded here
/// survives the process being killed at any point.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new() -> Result<Self, DatabaseError> {
        let path = Self::db_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }
        Self::open(&path)
    }

    /// Opens (or creates) a database at an explicit path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.initialize_tables()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.initialize_tables()?;
        Ok(db)
    }

    fn db_path() -> Result<PathBuf, DatabaseError> {
        let dirs = directories::ProjectDirs::from("com", "focusbar", "Focusbar")
            .ok_or(DatabaseError::DirectoryCreation)?;
        Ok(dirs.data_dir().join("focusbar.db"))
    }

    fn initialize_tables(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS timer_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS daily_stats (
                date TEXT PRIMARY KEY,
                completed_sessions INTEGER NOT NULL DEFAULT 0,
                total_focus_minutes INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        Ok(())
    }

    // --- settings ---

    pub fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(settings)?;
        self.set_state_in("settings", "config", &json)
    }

    pub fn load_settings(&self) -> Result<Settings, DatabaseError> {
        match self.get_state_in("settings", "config") {
            Some(json) => match serde_json::from_str(&json) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    warn!("Stored settings are unreadable, falling back to defaults: {e}");
                    Ok(Settings::default())
                }
            },
            None => Ok(Settings::default()),
        }
    }

    // --- timer state ---

    /// Writes the full timer snapshot. The two countdown keys are mutually
    /// exclusive; the stale one is removed before the fresh one is written so
    /// the store never holds both.
    pub fn save_timer(&self, snapshot: &TimerSnapshot) -> Result<(), DatabaseError> {
        self.set_state(KEY_PHASE, snapshot.phase.tag())?;
        self.set_state(
            KEY_COMPLETED_SESSIONS,
            &snapshot.completed_sessions.to_string(),
        )?;
        match (snapshot.phase_end_at, snapshot.paused_remaining) {
            (Some(end), _) => {
                self.remove_state(KEY_PAUSED_REMAINING)?;
                let secs = end.timestamp_micros() as f64 / 1_000_000.0;
                self.set_state(KEY_PHASE_END_AT, &secs.to_string())?;
            }
            (None, Some(remaining)) => {
                self.remove_state(KEY_PHASE_END_AT)?;
                self.set_state(KEY_PAUSED_REMAINING, &remaining.as_secs_f64().to_string())?;
            }
            (None, None) => {
                self.remove_state(KEY_PHASE_END_AT)?;
                self.remove_state(KEY_PAUSED_REMAINING)?;
            }
        }
        Ok(())
    }

    /// Loads the persisted timer snapshot, or `None` if no phase was ever
    /// recorded. Unreadable values are treated as absent rather than errors.
    pub fn load_timer(&self) -> Result<Option<TimerSnapshot>, DatabaseError> {
        let phase = match self
            .get_state(KEY_PHASE)
            .and_then(|tag| Phase::from_tag(&tag))
        {
            Some(phase) => phase,
            None => return Ok(None),
        };
        let completed_sessions = self
            .get_state(KEY_COMPLETED_SESSIONS)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let phase_end_at = self
            .get_state(KEY_PHASE_END_AT)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|secs| secs.is_finite())
            .and_then(|secs| DateTime::from_timestamp_micros((secs * 1_000_000.0) as i64));
        let paused_remaining = if phase_end_at.is_some() {
            None
        } else {
            self.get_state(KEY_PAUSED_REMAINING)
                .and_then(|v| v.parse::<f64>().ok())
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .filter(|d| *d > Duration::ZERO)
        };
        Ok(Some(TimerSnapshot {
            phase,
            completed_sessions,
            phase_end_at,
            paused_remaining,
        }))
    }

    /// Removes every timer key. The message is kept; it is cleared
    /// independently.
    pub fn clear_timer(&self) -> Result<(), DatabaseError> {
        self.remove_state(KEY_PHASE)?;
        self.remove_state(KEY_COMPLETED_SESSIONS)?;
        self.remove_state(KEY_PHASE_END_AT)?;
        self.remove_state(KEY_PAUSED_REMAINING)?;
        Ok(())
    }

    // --- message ---

    pub fn save_message(&self, message: Option<&str>) -> Result<(), DatabaseError> {
        match message {
            Some(text) => self.set_state(KEY_MESSAGE, text),
            None => self.remove_state(KEY_MESSAGE),
        }
    }

    pub fn load_message(&self) -> Result<Option<String>, DatabaseError> {
        Ok(self.get_state(KEY_MESSAGE).filter(|m| !m.is_empty()))
    }

    // --- daily stats ---

    pub fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let date = session.last_date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_stats (date, completed_sessions, total_focus_minutes)
             VALUES (?1, ?2, ?3)",
            params![date, session.sessions_today, session.focus_mins_today],
        )?;
        Ok(())
    }

    pub fn load_today_session(&self) -> Result<Session, DatabaseError> {
        let today = Local::now().date_naive();
        let stats = self.get_daily_stats(today)?;
        Ok(Session {
            sessions_today: stats.completed_sessions,
            focus_mins_today: stats.total_focus_minutes,
            last_date: today,
        })
    }

    pub fn get_daily_stats(&self, date: NaiveDate) -> Result<DailyStats, DatabaseError> {
        let key = date.format("%Y-%m-%d").to_string();
        let result = self.conn.query_row(
            "SELECT completed_sessions, total_focus_minutes FROM daily_stats WHERE date = ?1",
            params![key],
            |row| {
                Ok(DailyStats {
                    date,
                    completed_sessions: row.get(0)?,
                    total_focus_minutes: row.get(1)?,
                })
            },
        );
        match result {
            Ok(stats) => Ok(stats),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(DailyStats::new(date)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn reset_today(&self) -> Result<(), DatabaseError> {
        let key = Local::now().date_naive().format("%Y-%m-%d").to_string();
        self.conn
            .execute("DELETE FROM daily_stats WHERE date = ?1", params![key])?;
        Ok(())
    }

    // --- key/value plumbing ---

    fn set_state(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.set_state_in("timer_state", key, value)
    }

    fn get_state(&self, key: &str) -> Option<String> {
        self.get_state_in("timer_state", key)
    }

    fn remove_state(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM timer_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn set_state_in(&self, table: &str, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            &format!("INSERT OR REPLACE INTO {table} (key, value) VALUES (?1, ?2)"),
            params![key, value],
        )?;
        Ok(())
    }

    fn get_state_in(&self, table: &str, key: &str) -> Option<String> {
        self.conn
            .query_row(
                &format!("SELECT value FROM {table} WHERE key = ?1"),
                params![key],
                |row| row.get(0),
            )
            .ok()
    }
}
