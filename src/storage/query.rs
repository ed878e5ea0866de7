//! Query Builder - pure translation of filters and partial updates into
//! parameterized SQL plus a positionally-ordered argument list.
//!
//! Predicates and their arguments are accumulated as pairs and rendered last,
//! so placeholder order and argument order cannot drift apart. Nothing in
//! this module touches the store.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::types::Value;

use crate::song::SongUpdate;
use crate::{Error, Result};

pub(crate) const SONG_COLUMNS: &str = "id, group_name, name, link, release_date, inserted_at";
pub(crate) const VERSE_COLUMNS: &str = "song_id, verse_number, verse_text";

/// An ordered list of SQL fragments, each paired with exactly one argument.
///
/// Fragments use unnumbered `?` placeholders, which SQLite binds in order of
/// appearance; pushing fragment and argument together is what keeps the two
/// sequences in lockstep.
#[derive(Default)]
struct ClauseList {
    fragments: Vec<&'static str>,
    args: Vec<Value>,
}

impl ClauseList {
    fn push(&mut self, fragment: &'static str, arg: Value) {
        self.fragments.push(fragment);
        self.args.push(arg);
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn render(&self, separator: &str) -> String {
        self.fragments.join(separator)
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Wrap a filter value in `%` wildcards, escaping any `%`, `_`, or `\` it
/// carries so the value always matches as a literal substring. The paired
/// predicate must carry `ESCAPE '\'`.
fn like_pattern(value: &str) -> Value {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Value::Text(format!("%{escaped}%"))
}

/// Build the filtered, optionally paginated song listing.
///
/// Recognized filter keys: `group` and `name` (case-insensitive substring;
/// SQLite's LIKE is ASCII case-insensitive by default) and `release_date`
/// (exact match). Unrecognized keys and empty values are ignored.
///
/// If `limit > 0` the listing is ordered by release date, ties broken by id
/// (insertion order), and page-limited. If `limit <= 0` no ordering or
/// pagination clause is appended; "no limit" and "degenerate limit" are
/// indistinguishable to the caller by contract.
pub fn list_songs(
    filters: &HashMap<String, String>,
    limit: i64,
    offset: i64,
) -> (String, Vec<Value>) {
    let mut predicates = ClauseList::default();
    if let Some(value) = filters.get("group").filter(|v| !v.is_empty()) {
        predicates.push("group_name LIKE ? ESCAPE '\\'", like_pattern(value));
    }
    if let Some(value) = filters.get("name").filter(|v| !v.is_empty()) {
        predicates.push("name LIKE ? ESCAPE '\\'", like_pattern(value));
    }
    if let Some(value) = filters.get("release_date").filter(|v| !v.is_empty()) {
        predicates.push("release_date = ?", text(value));
    }

    let mut sql = format!("SELECT {SONG_COLUMNS} FROM songs");
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.render(" AND "));
    }

    let mut args = predicates.args;
    if limit > 0 {
        sql.push_str(" ORDER BY release_date, id LIMIT ? OFFSET ?");
        args.push(Value::Integer(limit));
        args.push(Value::Integer(offset));
    }

    (sql, args)
}

/// Build the verse listing for one song, ordered by verse number.
///
/// The same `limit > 0` pagination rule as [`list_songs`] applies; passing
/// `limit <= 0` yields the complete verse sequence.
pub fn list_verses(song_id: i64, limit: i64, offset: i64) -> (String, Vec<Value>) {
    let mut sql =
        format!("SELECT {VERSE_COLUMNS} FROM verses WHERE song_id = ? ORDER BY verse_number");
    let mut args = vec![Value::Integer(song_id)];
    if limit > 0 {
        sql.push_str(" LIMIT ? OFFSET ?");
        args.push(Value::Integer(limit));
        args.push(Value::Integer(offset));
    }
    (sql, args)
}

/// Build the song-row partial update, honoring the empty-string-is-absent
/// policy. Returns `Ok(None)` when no scalar field is present; an update
/// carrying only verse edits is not an error at this layer, it simply
/// produces no song-row statement.
///
/// A present `release_date` must parse as `%Y-%m-%d`; anything else is a
/// `ConstraintViolation`. The column is TEXT, so an unvalidated write would
/// leave a row that can never be read back as a date.
pub fn update_song(song_id: i64, update: &SongUpdate) -> Result<Option<(String, Vec<Value>)>> {
    let mut assignments = ClauseList::default();
    if let Some(value) = SongUpdate::present(&update.group) {
        assignments.push("group_name = ?", text(value));
    }
    if let Some(value) = SongUpdate::present(&update.name) {
        assignments.push("name = ?", text(value));
    }
    if let Some(value) = SongUpdate::present(&update.release_date) {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| Error::ConstraintViolation(format!("invalid release date: {value:?}")))?;
        assignments.push("release_date = ?", text(value));
    }
    if let Some(value) = SongUpdate::present(&update.link) {
        assignments.push("link = ?", text(value));
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    let sql = format!("UPDATE songs SET {} WHERE id = ?", assignments.render(", "));
    let mut args = assignments.args;
    args.push(Value::Integer(song_id));
    Ok(Some((sql, args)))
}

/// Build one verse-text replacement keyed by `(song_id, verse_number)`.
pub fn update_verse(song_id: i64, verse_number: u32, text_value: &str) -> (String, Vec<Value>) {
    (
        "UPDATE verses SET verse_text = ? WHERE song_id = ? AND verse_number = ?".to_string(),
        vec![
            text(text_value),
            Value::Integer(song_id),
            Value::Integer(i64::from(verse_number)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn list_songs_without_filters_or_limit_is_a_bare_select() {
        let (sql, args) = list_songs(&HashMap::new(), 0, 0);
        assert_eq!(sql, format!("SELECT {SONG_COLUMNS} FROM songs"));
        assert!(args.is_empty());
    }

    #[test]
    fn list_songs_appends_conjunctive_predicates_in_lockstep_with_args() {
        let (sql, args) = list_songs(
            &filters(&[("group", "mus"), ("name", "star"), ("release_date", "2006-07-03")]),
            10,
            5,
        );
        assert_eq!(
            sql,
            format!(
                "SELECT {SONG_COLUMNS} FROM songs \
                 WHERE group_name LIKE ? ESCAPE '\\' AND name LIKE ? ESCAPE '\\' \
                 AND release_date = ? \
                 ORDER BY release_date, id LIMIT ? OFFSET ?"
            )
        );
        assert_eq!(
            args,
            vec![
                Value::Text("%mus%".to_string()),
                Value::Text("%star%".to_string()),
                Value::Text("2006-07-03".to_string()),
                Value::Integer(10),
                Value::Integer(5),
            ]
        );
    }

    #[test]
    fn list_songs_ignores_unrecognized_keys_and_empty_values() {
        let (sql, args) = list_songs(&filters(&[("album", "x"), ("group", "")]), 0, 0);
        assert_eq!(sql, format!("SELECT {SONG_COLUMNS} FROM songs"));
        assert!(args.is_empty());
    }

    #[test]
    fn non_positive_limit_skips_ordering_and_pagination() {
        let (sql, args) = list_songs(&filters(&[("group", "abba")]), 0, 7);
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("ORDER BY"));
        assert_eq!(args.len(), 1);

        let (sql, _) = list_songs(&filters(&[("group", "abba")]), -1, 0);
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn list_verses_pages_after_the_song_id_argument() {
        let (sql, args) = list_verses(42, 1, 1);
        assert_eq!(
            sql,
            format!(
                "SELECT {VERSE_COLUMNS} FROM verses WHERE song_id = ? \
                 ORDER BY verse_number LIMIT ? OFFSET ?"
            )
        );
        assert_eq!(
            args,
            vec![Value::Integer(42), Value::Integer(1), Value::Integer(1)]
        );

        let (sql, args) = list_verses(42, 0, 0);
        assert!(!sql.contains("LIMIT"));
        assert_eq!(args, vec![Value::Integer(42)]);
    }

    #[test]
    fn like_wildcards_match_literally() {
        let (_, args) = list_songs(&filters(&[("group", "100%_pure\\")]), 0, 0);
        assert_eq!(args, vec![Value::Text("%100\\%\\_pure\\\\%".to_string())]);
    }

    #[test]
    fn update_song_emits_only_present_fields() {
        let update = SongUpdate {
            name: Some("Starlight".to_string()),
            link: Some("https://example.com/starlight".to_string()),
            ..Default::default()
        };
        let (sql, args) = update_song(9, &update).unwrap().unwrap();
        assert_eq!(sql, "UPDATE songs SET name = ?, link = ? WHERE id = ?");
        assert_eq!(
            args,
            vec![
                Value::Text("Starlight".to_string()),
                Value::Text("https://example.com/starlight".to_string()),
                Value::Integer(9),
            ]
        );
    }

    #[test]
    fn update_song_treats_empty_strings_as_absent() {
        let update = SongUpdate {
            group: Some(String::new()),
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update_song(9, &update).unwrap().is_none());
    }

    #[test]
    fn update_song_rejects_a_malformed_release_date() {
        let update = SongUpdate {
            release_date: Some("not-a-date".to_string()),
            ..Default::default()
        };
        let err = update_song(9, &update).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        // Well-formed but impossible dates are rejected too.
        let update = SongUpdate {
            release_date: Some("2006-13-45".to_string()),
            ..Default::default()
        };
        assert!(update_song(9, &update).is_err());
    }

    #[test]
    fn verse_only_update_produces_no_song_statement() {
        let mut update = SongUpdate::default();
        update.verses.insert(2, "new text".to_string());
        assert!(update_song(9, &update).unwrap().is_none());
    }

    #[test]
    fn update_verse_is_keyed_by_song_and_number() {
        let (sql, args) = update_verse(9, 2, "new text");
        assert_eq!(
            sql,
            "UPDATE verses SET verse_text = ? WHERE song_id = ? AND verse_number = ?"
        );
        assert_eq!(
            args,
            vec![
                Value::Text("new text".to_string()),
                Value::Integer(9),
                Value::Integer(2),
            ]
        );
    }
}
