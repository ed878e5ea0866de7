//! Song service - thin orchestration over the repository
//!
//! Splits raw lyric text into verses, applies the paging-string defaults,
//! and assembles the lyrics/library response shapes. Holds no state of its
//! own beyond the shared store handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;

use crate::song::{NewSong, Song, SongUpdate};
use crate::storage::SqliteStore;
use crate::Result;

/// Default page size when the caller sends no (or an unparseable) limit.
const DEFAULT_LIMIT: i64 = 10;

/// One verse of a lyrics response.
#[derive(Debug, Serialize)]
pub struct VerseText {
    pub verse_number: u32,
    pub text: String,
}

/// Lyrics response: one song plus a page of its verses.
#[derive(Debug, Serialize)]
pub struct SongLyrics {
    pub group: String,
    pub name: String,
    pub lyrics: Vec<VerseText>,
}

/// One library entry: the song row plus its complete verse sequence.
#[derive(Debug, Serialize)]
pub struct SongWithLyrics {
    #[serde(flatten)]
    pub song: Song,
    pub lyrics: Vec<VerseText>,
}

/// Library response.
#[derive(Debug, Serialize)]
pub struct Library {
    pub songs: Vec<SongWithLyrics>,
}

/// Service facade over the song repository, safe for concurrent use.
#[derive(Clone)]
pub struct SongService {
    store: Arc<Mutex<SqliteStore>>,
}

impl SongService {
    pub fn new(store: Arc<Mutex<SqliteStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> MutexGuard<'_, SqliteStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Split raw lyric text into verses and persist song + verses atomically.
    pub fn add_song(
        &self,
        group: &str,
        name: &str,
        link: Option<String>,
        release_date: NaiveDate,
        text: &str,
    ) -> Result<i64> {
        let verses = split_into_verses(text);
        let song = NewSong {
            group: group.to_string(),
            name: name.to_string(),
            release_date,
            link,
        };

        self.store().add_song(&song, &verses).inspect_err(|err| {
            tracing::error!(group, name, error = %err, "failed to add song");
        })
    }

    pub fn delete_song(&self, song_id: i64) -> Result<()> {
        self.store().delete_song(song_id).inspect_err(|err| {
            tracing::error!(song_id, error = %err, "failed to delete song");
        })
    }

    pub fn update_song(&self, song_id: i64, update: &SongUpdate) -> Result<()> {
        self.store().update_song(song_id, update).inspect_err(|err| {
            tracing::error!(song_id, error = %err, "failed to update song");
        })
    }

    /// Fetch one song with a page of its verses. Fails with `NotFound` when
    /// the song does not exist.
    pub fn lyrics(
        &self,
        song_id: i64,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<SongLyrics> {
        let (limit, offset) = page_params(limit, offset);
        let store = self.store();

        let song = store.get_song(song_id).inspect_err(|err| {
            tracing::error!(song_id, error = %err, "failed to get song");
        })?;
        let verses = store.get_lyrics(song_id, limit, offset).inspect_err(|err| {
            tracing::error!(song_id, error = %err, "failed to get lyrics");
        })?;

        Ok(SongLyrics {
            group: song.group,
            name: song.name,
            lyrics: verses
                .into_iter()
                .map(|v| VerseText {
                    verse_number: v.verse_number,
                    text: v.text,
                })
                .collect(),
        })
    }

    /// Fetch the filtered song listing, each song carrying its full verse
    /// sequence.
    ///
    /// The per-song lyric reads are not atomic with respect to concurrent
    /// writers; a listing racing a concurrent add may observe a song without
    /// its just-added verses.
    pub fn library(
        &self,
        filters: &HashMap<String, String>,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<Library> {
        let (limit, offset) = page_params(limit, offset);
        let store = self.store();

        let songs = store.get_all_songs(filters, limit, offset).inspect_err(|err| {
            tracing::error!(error = %err, "failed to list songs");
        })?;

        let mut entries = Vec::with_capacity(songs.len());
        for song in songs {
            let verses = store.get_all_song_lyrics(song.id).inspect_err(|err| {
                tracing::error!(song_id = song.id, error = %err, "failed to get song lyrics");
            })?;
            entries.push(SongWithLyrics {
                song,
                lyrics: verses
                    .into_iter()
                    .map(|v| VerseText {
                        verse_number: v.verse_number,
                        text: v.text,
                    })
                    .collect(),
            });
        }

        Ok(Library { songs: entries })
    }
}

/// Split raw lyric text on blank-line boundaries, trimming whitespace and
/// dropping empty paragraphs.
pub fn split_into_verses(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|verse| !verse.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse caller-supplied paging strings; absent or unparseable values fall
/// back to `limit = 10, offset = 0`.
fn page_params(limit: Option<&str>, offset: Option<&str>) -> (i64, i64) {
    let limit = limit
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_LIMIT);
    let offset = offset.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SongService {
        SongService::new(Arc::new(Mutex::new(SqliteStore::open_in_memory().unwrap())))
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn split_trims_and_drops_empty_paragraphs() {
        let text = "first verse\n\n  second verse  \n\n\n\n   \n\nthird verse";
        assert_eq!(
            split_into_verses(text),
            vec!["first verse", "second verse", "third verse"]
        );
        assert!(split_into_verses("").is_empty());
        assert!(split_into_verses("\n\n \n\n").is_empty());
    }

    #[test]
    fn page_params_default_on_absent_or_garbage() {
        assert_eq!(page_params(None, None), (10, 0));
        assert_eq!(page_params(Some("5"), Some("2")), (5, 2));
        assert_eq!(page_params(Some("abc"), Some("2")), (10, 2));
        assert_eq!(page_params(Some("5"), Some("x")), (5, 0));
    }

    #[test]
    fn add_song_numbers_verses_from_paragraph_order() {
        let service = service();
        let id = service
            .add_song(
                "Muse",
                "Starlight",
                None,
                date("2006-07-03"),
                "far away\n\nthe starlight",
            )
            .unwrap();

        let lyrics = service.lyrics(id, None, None).unwrap();
        assert_eq!(lyrics.group, "Muse");
        assert_eq!(lyrics.lyrics.len(), 2);
        assert_eq!(lyrics.lyrics[0].verse_number, 1);
        assert_eq!(lyrics.lyrics[0].text, "far away");
        assert_eq!(lyrics.lyrics[1].verse_number, 2);
    }

    #[test]
    fn library_carries_full_lyrics_per_song() {
        let service = service();
        service
            .add_song("Muse", "Starlight", None, date("2006-07-03"), "v1\n\nv2")
            .unwrap();
        service
            .add_song("ABBA", "SOS", None, date("1975-06-01"), "")
            .unwrap();

        let library = service.library(&HashMap::new(), None, None).unwrap();
        assert_eq!(library.songs.len(), 2);

        let starlight = library
            .songs
            .iter()
            .find(|s| s.song.name == "Starlight")
            .unwrap();
        assert_eq!(starlight.lyrics.len(), 2);

        let sos = library.songs.iter().find(|s| s.song.name == "SOS").unwrap();
        assert!(sos.lyrics.is_empty());
    }

    #[test]
    fn lyrics_for_a_missing_song_is_not_found() {
        let service = service();
        assert!(matches!(
            service.lyrics(404, None, None),
            Err(crate::Error::NotFound(404))
        ));
    }
}
