//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - songs(id, group_name, name, link, release_date, inserted_at)
//! - verses(song_id, verse_number, verse_text), unique on (song_id, verse_number)
//!
//! Verses cascade-delete with their song. Schema changes go through the
//! versioned migrations in [`schema`]; all dynamic SQL is assembled by the
//! pure builders in [`query`].

pub mod query;
pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};
