//! Entity definitions shared by every other component

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A catalog entry identifying one track by group and title.
///
/// `id` and `inserted_at` are store-assigned and immutable once set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub group: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub link: Option<String>,
    pub inserted_at: NaiveDateTime,
}

/// The creation shape of a song, before the store assigns identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSong {
    pub group: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub link: Option<String>,
}

/// One numbered lyric paragraph belonging to exactly one song.
///
/// Identity is `(song_id, verse_number)`; verse numbers are 1-based and
/// contiguous within a song, assigned at creation from paragraph order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub song_id: i64,
    pub verse_number: u32,
    pub text: String,
}

/// A sparse partial-update request: absent fields are left unchanged.
///
/// An empty-string scalar is treated the same as an absent one, so an update
/// cannot clear a field to empty. `verses` maps verse numbers to replacement
/// text; it carries no ordering significance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SongUpdate {
    pub group: Option<String>,
    pub name: Option<String>,
    /// Date-formatted string (`YYYY-MM-DD`).
    pub release_date: Option<String>,
    pub link: Option<String>,
    #[serde(default)]
    pub verses: BTreeMap<u32, String>,
}

impl SongUpdate {
    /// Apply the empty-string-is-absent policy to one scalar field.
    pub(crate) fn present(field: &Option<String>) -> Option<&str> {
        field.as_deref().filter(|value| !value.is_empty())
    }

    /// True when no scalar field survives the absence rule and there are no
    /// verse edits either.
    pub fn is_empty(&self) -> bool {
        Self::present(&self.group).is_none()
            && Self::present(&self.name).is_none()
            && Self::present(&self.release_date).is_none()
            && Self::present(&self.link).is_none()
            && self.verses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_count_as_absent() {
        let update = SongUpdate {
            name: Some(String::new()),
            link: Some(String::new()),
            ..Default::default()
        };
        assert!(update.is_empty());
        assert_eq!(SongUpdate::present(&update.name), None);
    }

    #[test]
    fn verse_edits_make_an_update_non_empty() {
        let mut update = SongUpdate::default();
        update.verses.insert(2, "new text".to_string());
        assert!(!update.is_empty());
    }
}
