//! Database Connection and Setup
//!
//! Manages the SQLite connection and schema migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared handle to the archive database
#[derive(Clone)]
pub struct DbState {
    conn: Arc<Mutex<Connection>>,
}

impl DbState {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Connection handle for repositories
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

/// Open the database at `db_path` (`:memory:` for a private in-memory one) and migrate it
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Database(format!("Failed to open {}: {}", db_path.display(), e)))?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    run_migrations(&conn)?;

    log::info!("Tag database ready at {}", db_path.display());
    Ok(DbState::new(conn))
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            banned INTEGER NOT NULL DEFAULT 0,
            canonical INTEGER NOT NULL DEFAULT 0,
            canonical_id INTEGER REFERENCES tags(id),
            taggings_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER,
            updated_at INTEGER
        )",
        (),
    )?;

    // Fandom backfill arrived after the first schema
    if !column_exists(conn, "tags", "fandom_id")? {
        conn.execute("ALTER TABLE tags ADD COLUMN fandom_id INTEGER REFERENCES tags(id)", ())
            .map_err(|e| DomainError::Database(format!("Failed to add fandom_id: {}", e)))?;
    }

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_name_type ON tags(name, type);
         CREATE INDEX IF NOT EXISTS idx_tags_canonical_id ON tags(canonical_id);
         CREATE INDEX IF NOT EXISTS idx_tags_fandom_id ON tags(fandom_id);

         CREATE TABLE IF NOT EXISTS taggings (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             tag_id INTEGER NOT NULL REFERENCES tags(id),
             taggable_type TEXT NOT NULL,
             taggable_id INTEGER NOT NULL,
             UNIQUE (tag_id, taggable_type, taggable_id)
         );
         CREATE INDEX IF NOT EXISTS idx_taggings_taggable ON taggings(taggable_type, taggable_id);",
    )?;

    Ok(())
}
