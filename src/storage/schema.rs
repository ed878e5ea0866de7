//! Versioned schema migrations
//!
//! Applied once at store construction; a failure aborts construction so a
//! partially-initialized repository can never be observed.

use rusqlite::{Connection, params};

use crate::{Error, Result};

/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
CREATE TABLE IF NOT EXISTS songs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_name TEXT NOT NULL CHECK (group_name <> ''),
    name TEXT NOT NULL CHECK (name <> ''),
    link TEXT,
    release_date TEXT NOT NULL,
    inserted_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS verses (
    song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
    verse_number INTEGER NOT NULL CHECK (verse_number >= 1),
    verse_text TEXT NOT NULL CHECK (verse_text <> ''),
    PRIMARY KEY (song_id, verse_number)
);

CREATE INDEX IF NOT EXISTS idx_songs_release_date ON songs(release_date);
CREATE INDEX IF NOT EXISTS idx_songs_group_name ON songs(group_name);
"#;

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "songs_and_verses",
    sql: MIGRATION_001,
}];

const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

/// Apply every pending migration, each inside its own transaction.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(CREATE_MIGRATIONS_TABLE)?;

    for migration in MIGRATIONS {
        let applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
            [migration.version],
            |row| row.get(0),
        )?;
        if applied {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit().map_err(|e| {
            Error::TransactionFailed(format!("migration {}: {e}", migration.version))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(applied as usize, MIGRATIONS.len());
    }

    #[test]
    fn migrations_are_ordered_by_version() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }
}
