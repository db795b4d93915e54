//! Store schema versioning.
//!
//! The store records its own layout version in `metadata`. This is separate
//! from the per-snapshot `schema_version` column, which tracks the shape of
//! the serialized form document.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use super::schema::SCHEMA_STATEMENTS;
use crate::error::{Error, Result};

/// Layout version this build writes.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "store_version";

/// Create missing tables and upgrade older layouts.
///
/// # Errors
///
/// Returns an error if a statement fails or the stored version is newer
/// than this build understands.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = store_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "store version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        upgrade(conn, version)?;
    }
    Ok(())
}

/// Stored layout version, 0 for a fresh database.
fn store_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid store version: {value}"),
        }),
    }
}

fn set_store_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn upgrade(conn: &Connection, from: i32) -> Result<()> {
    for version in (from + 1)..=CURRENT_VERSION {
        match version {
            // Base layout, created above.
            1 => {}
            _ => {
                return Err(Error::DatabaseMigration {
                    message: format!("no upgrade step to version {version}"),
                })
            }
        }
        set_store_version(conn, version)?;
    }
    info!(from, to = CURRENT_VERSION, "Upgraded store layout");
    Ok(())
}
