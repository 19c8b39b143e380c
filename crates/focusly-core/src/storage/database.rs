//! SQLite-based per-user pomodoro settings.
//!
//! Each user has at most one settings row. Reading settings for a user
//! who has none creates the defaults (25/5/15 minutes, long break every
//! 4 work phases, 4 rounds, `BELL`).

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, SettingsProvider};
use crate::error::{DatabaseError, Result};
use crate::timer::{PomodoroConfig, SoundEffect};

/// SQLite database holding pomodoro settings keyed by user id.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/focusly/focusly.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusly.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pomodoro_settings (
                user_id              TEXT PRIMARY KEY,
                work_duration        INTEGER NOT NULL,
                short_break_duration INTEGER NOT NULL,
                long_break_duration  INTEGER NOT NULL,
                long_break_interval  INTEGER NOT NULL,
                rounds               INTEGER NOT NULL,
                sound_effect         TEXT NOT NULL DEFAULT 'BELL',
                sound_effect_volume  REAL NOT NULL DEFAULT 0.5,
                updated_at           TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Settings stored for `user_id`, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored row is corrupt.
    pub fn pomodoro_settings(&self, user_id: &str) -> Result<Option<PomodoroConfig>> {
        let row = self
            .conn
            .query_row(
                "SELECT work_duration, short_break_duration, long_break_duration,
                        long_break_interval, rounds, sound_effect, sound_effect_volume
                 FROM pomodoro_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, f64>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((work, short, long, interval, rounds, effect, volume)) = row else {
            return Ok(None);
        };
        let corrupt = |source| DatabaseError::CorruptRow {
            user_id: user_id.to_string(),
            source,
        };
        let sound_effect = effect.parse::<SoundEffect>().map_err(corrupt)?;
        let config = PomodoroConfig {
            work_duration: work,
            short_break_duration: short,
            long_break_duration: long,
            long_break_interval: interval,
            rounds,
            sound_effect,
            sound_effect_volume: volume,
        }
        .validated()
        .map_err(corrupt)?;
        Ok(Some(config))
    }

    /// Settings for `user_id`, creating the defaults on first access.
    ///
    /// # Errors
    /// Returns an error if the query or insert fails.
    pub fn get_or_create_settings(&self, user_id: &str) -> Result<PomodoroConfig> {
        if let Some(config) = self.pomodoro_settings(user_id)? {
            return Ok(config);
        }
        let config = PomodoroConfig::default();
        self.save_settings(user_id, &config)?;
        tracing::info!(user_id, "created default pomodoro settings");
        Ok(config)
    }

    /// Insert or replace the settings for `user_id`.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid or the write fails.
    pub fn save_settings(&self, user_id: &str, config: &PomodoroConfig) -> Result<()> {
        config.validate()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO pomodoro_settings (
                user_id, work_duration, short_break_duration, long_break_duration,
                long_break_interval, rounds, sound_effect, sound_effect_volume, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user_id,
                config.work_duration,
                config.short_break_duration,
                config.long_break_duration,
                config.long_break_interval,
                config.rounds,
                config.sound_effect.id(),
                config.sound_effect_volume,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Remove the settings row. Returns whether one existed.
    pub fn delete_settings(&self, user_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM pomodoro_settings WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(n > 0)
    }

    /// Provider view of one user's settings.
    pub fn for_user<'a>(&'a self, user_id: &'a str) -> UserSettings<'a> {
        UserSettings { db: self, user_id }
    }
}

/// [`SettingsProvider`] backed by one user's row.
pub struct UserSettings<'a> {
    db: &'a Database,
    user_id: &'a str,
}

impl SettingsProvider for UserSettings<'_> {
    fn pomodoro_config(&self) -> Result<PomodoroConfig> {
        self.db.get_or_create_settings(self.user_id)
    }
}
