//! SQLite song repository
//!
//! `SqliteStore` is the public persistence contract: atomic song+verses
//! creation, filtered listing, paginated verse retrieval, partial updates,
//! and cascade deletion. Multi-row writes go through [`SqliteStore::with_transaction`],
//! the unit-of-work coordinator; single-table reads go straight to the
//! connection.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};

use super::{query, schema};
use crate::song::{NewSong, Song, SongUpdate, Verse};
use crate::{Error, Result};

/// SQLite-backed song repository.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if it doesn't exist) and apply pending
    /// migrations. A migration failure aborts construction.
    pub fn open(path: &Path) -> Result<Self> {
        Self::initialize(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        // Cascade deletion of verses relies on this per-connection pragma.
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        schema::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    /// Run a unit of work under one transaction.
    ///
    /// Exactly one of commit or rollback happens per invocation: on success
    /// the transaction commits (a commit failure is `TransactionFailed`); on
    /// failure it rolls back and the original error propagates, unless the
    /// rollback itself fails, which is reported as `TransactionFailed`
    /// carrying both. The unit of work must not open another transaction on
    /// the same handle.
    pub fn with_transaction<T>(
        &mut self,
        work: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction()?;
        match work(&tx) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| Error::TransactionFailed(format!("commit: {e}")))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    return Err(Error::TransactionFailed(format!(
                        "rollback after `{err}`: {rollback_err}"
                    )));
                }
                Err(err)
            }
        }
    }

    // ========== Song Operations ==========

    /// Insert a song and its verses as one atomic unit, returning the
    /// store-assigned song id.
    ///
    /// Verse numbers are assigned here from slice order, 1-based, so the
    /// contiguous-numbering invariant holds regardless of the caller. An
    /// empty verse slice is valid. The first verse failure aborts the whole
    /// transaction; no partial song is ever observable.
    pub fn add_song(&mut self, song: &NewSong, verses: &[String]) -> Result<i64> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO songs (group_name, name, link, release_date) VALUES (?1, ?2, ?3, ?4)",
                params![song.group, song.name, song.link, song.release_date],
            )?;
            let song_id = tx.last_insert_rowid();

            for (index, text) in verses.iter().enumerate() {
                tx.execute(
                    "INSERT INTO verses (song_id, verse_number, verse_text) VALUES (?1, ?2, ?3)",
                    params![song_id, index as i64 + 1, text],
                )?;
            }

            Ok(song_id)
        })
    }

    /// Delete a song; its verses go with it via the foreign-key cascade.
    ///
    /// Deleting an id that does not exist is a success with no observable
    /// effect, so deletes are idempotent.
    pub fn delete_song(&self, song_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM songs WHERE id = ?1", [song_id])?;
        Ok(())
    }

    /// Fetch one song, failing with `NotFound` on a miss.
    pub fn get_song(&self, song_id: i64) -> Result<Song> {
        let sql = format!(
            "SELECT {} FROM songs WHERE id = ?1",
            query::SONG_COLUMNS
        );
        self.conn
            .query_row(&sql, [song_id], row_to_song)
            .optional()?
            .ok_or(Error::NotFound(song_id))
    }

    /// Fetch the filtered, optionally paginated song listing. An empty match
    /// is an empty vector, never an error.
    pub fn get_all_songs(
        &self,
        filters: &HashMap<String, String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Song>> {
        let (sql, args) = query::list_songs(filters, limit, offset);
        let mut stmt = self.conn.prepare(&sql)?;
        let songs = stmt
            .query_map(params_from_iter(args.iter()), row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    // ========== Verse Operations ==========

    /// Fetch one page of a song's verses, ordered by verse number.
    ///
    /// Song existence is not validated: an unknown or lyric-less song yields
    /// an empty vector.
    pub fn get_lyrics(&self, song_id: i64, limit: i64, offset: i64) -> Result<Vec<Verse>> {
        let (sql, args) = query::list_verses(song_id, limit, offset);
        let mut stmt = self.conn.prepare(&sql)?;
        let verses = stmt
            .query_map(params_from_iter(args.iter()), row_to_verse)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(verses)
    }

    /// Fetch the complete, unpaginated verse sequence for one song.
    pub fn get_all_song_lyrics(&self, song_id: i64) -> Result<Vec<Verse>> {
        self.get_lyrics(song_id, 0, 0)
    }

    // ========== Update Operations ==========

    /// Apply a partial update to a song and/or its verses.
    ///
    /// An update with no scalar fields (under the empty-string-is-absent
    /// rule) and no verse edits fails with `NoFieldsToUpdate`; a malformed
    /// `release_date` fails with `ConstraintViolation` before anything is
    /// written. The song-row statement and every verse statement run inside
    /// one unit of work, so a partial failure leaves no observable change.
    /// Zero rows affected — an unknown song id or a verse number the song
    /// does not have — is a success, mirroring delete idempotence.
    pub fn update_song(&mut self, song_id: i64, update: &SongUpdate) -> Result<()> {
        let song_statement = query::update_song(song_id, update)?;
        if song_statement.is_none() && update.verses.is_empty() {
            return Err(Error::NoFieldsToUpdate);
        }

        self.with_transaction(|tx| {
            if let Some((sql, args)) = &song_statement {
                tx.execute(sql, params_from_iter(args.iter()))?;
            }
            for (&verse_number, text) in &update.verses {
                let (sql, args) = query::update_verse(song_id, verse_number, text);
                tx.execute(&sql, params_from_iter(args.iter()))?;
            }
            Ok(())
        })
    }

    // ========== Statistics ==========

    /// Row counts for the CLI stats command.
    pub fn stats(&self) -> Result<StoreStats> {
        let songs: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        let verses: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM verses", [], |row| row.get(0))?;
        Ok(StoreStats {
            songs: songs as usize,
            verses: verses as usize,
        })
    }
}

fn row_to_song(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        group: row.get(1)?,
        name: row.get(2)?,
        link: row.get(3)?,
        release_date: row.get(4)?,
        inserted_at: row.get(5)?,
    })
}

fn row_to_verse(row: &rusqlite::Row) -> rusqlite::Result<Verse> {
    Ok(Verse {
        song_id: row.get(0)?,
        verse_number: row.get(1)?,
        text: row.get(2)?,
    })
}

/// Library row counts.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub songs: usize,
    pub verses: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Library Statistics:")?;
        writeln!(f, "  Songs: {}", self.songs)?;
        writeln!(f, "  Verses: {}", self.verses)
    }
}
