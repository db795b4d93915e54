//! Persistent storage for the form document.
//!
//! The whole [`FormState`] is serialized to JSON and kept under a single key
//! in an `SQLite` key-value table. Saving overwrites the previous snapshot;
//! there is no history.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::form::FormState;

/// Key the form snapshot is stored under.
pub const FORM_KEY: &str = "fire_iso_form";

/// Version of the serialized form layout written by this build.
pub const SNAPSHOT_VERSION: i64 = 1;

/// Single-snapshot store for the form document.
#[derive(Debug)]
pub struct FormStore {
    path: PathBuf,
    conn: Connection,
    /// Digest of the snapshot currently on disk, if known.
    last_digest: Option<blake3::Hash>,
}

impl FormStore {
    /// Open or create the store at `path`.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created or
    /// the schema cannot be initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening form store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Form store opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            last_digest: None,
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            last_digest: None,
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<String>> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [FORM_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    /// Load the saved form, or defaults if there is none.
    ///
    /// An unreadable snapshot is logged and treated as absent; it stays on
    /// disk until the next save overwrites it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database itself cannot be queried.
    pub fn load(&mut self) -> Result<FormState> {
        let Some(raw) = self.read_raw()? else {
            debug!("No saved form, starting from defaults");
            return Ok(FormState::default());
        };

        match serde_json::from_str::<FormState>(&raw) {
            Ok(state) => {
                self.last_digest = Some(blake3::hash(raw.as_bytes()));
                debug!(bytes = raw.len(), "Loaded saved form");
                Ok(state)
            }
            Err(e) => {
                let err = Error::PersistenceRead {
                    message: e.to_string(),
                };
                warn!(error = %err, "Ignoring saved form");
                Ok(FormState::default())
            }
        }
    }

    /// Overwrite the saved snapshot with `state`.
    ///
    /// Returns `false` when the snapshot is identical to the one last
    /// written and nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&mut self, state: &FormState) -> Result<bool> {
        let raw = serde_json::to_string(state)?;
        let digest = blake3::hash(raw.as_bytes());
        if self.last_digest == Some(digest) {
            debug!("Form unchanged, skipping save");
            return Ok(false);
        }

        self.conn.execute(
            r"
            INSERT INTO kv (key, value, schema_version, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                schema_version = excluded.schema_version,
                updated_at = excluded.updated_at
            ",
            params![FORM_KEY, raw, SNAPSHOT_VERSION, Utc::now().to_rfc3339()],
        )?;
        self.last_digest = Some(digest);
        debug!(bytes = raw.len(), "Saved form");
        Ok(true)
    }

    /// Delete the saved snapshot and return a fresh form.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn reset(&mut self) -> Result<FormState> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", [FORM_KEY])?;
        self.last_digest = None;
        info!(removed, "Form reset");
        Ok(FormState::default())
    }

    /// Describe the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let row: Option<(i64, i64, String)> = self
            .conn
            .query_row(
                "SELECT length(value), schema_version, updated_at FROM kv WHERE key = ?1",
                [FORM_KEY],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(match row {
            Some((len, version, updated_at)) => StoreStats {
                has_snapshot: true,
                snapshot_bytes: u64::try_from(len).unwrap_or(0),
                schema_version: Some(version),
                updated_at: DateTime::parse_from_rfc3339(&updated_at)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
                db_size_bytes,
            },
            None => StoreStats {
                has_snapshot: false,
                snapshot_bytes: 0,
                schema_version: None,
                updated_at: None,
                db_size_bytes,
            },
        })
    }
}

/// Statistics about the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Whether a snapshot is saved.
    pub has_snapshot: bool,
    /// Length of the serialized snapshot.
    pub snapshot_bytes: u64,
    /// Layout version the snapshot was written with.
    pub schema_version: Option<i64>,
    /// When the snapshot was last written.
    pub updated_at: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
