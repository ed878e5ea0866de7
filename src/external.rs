//! External metadata lookup client
//!
//! Newly added songs are enriched by a GET against the configured metadata
//! service before persisting. A blocking client; callers inside the async
//! server run it under `spawn_blocking`.

use serde::Deserialize;

use crate::{Error, Result};

/// Metadata returned by the external lookup for one (group, song) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchData {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(rename = "releaseDate")]
    pub release_date: String,
    pub text: String,
}

/// Fetch metadata from `{external_api}/info?group=..&song=..`.
///
/// Any transport failure, non-success status, or undecodable body is an
/// `External` error; nothing is retried here.
pub fn fetch_song(external_api: &str, group: &str, name: &str) -> Result<FetchData> {
    let url = format!("{external_api}/info");
    let response = ureq::get(&url)
        .query("group", group)
        .query("song", name)
        .call()
        .map_err(|err| Error::External(err.to_string()))?;

    response
        .into_json()
        .map_err(|err| Error::External(format!("invalid response body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_data_decodes_the_wire_shape() {
        let data: FetchData = serde_json::from_str(
            r#"{"link":"https://example.com/w","releaseDate":"2006-07-03","text":"v1\n\nv2"}"#,
        )
        .unwrap();
        assert_eq!(data.link.as_deref(), Some("https://example.com/w"));
        assert_eq!(data.release_date, "2006-07-03");

        // link is optional on the wire
        let data: FetchData =
            serde_json::from_str(r#"{"releaseDate":"2006-07-03","text":""}"#).unwrap();
        assert!(data.link.is_none());
    }

    #[test]
    fn unreachable_host_is_an_external_error() {
        let err = fetch_song("http://127.0.0.1:1", "Muse", "Starlight").unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }
}
