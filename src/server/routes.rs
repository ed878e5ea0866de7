use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::service::{Library, SongLyrics};
use crate::song::SongUpdate;
use crate::{Error, external};

#[derive(Deserialize)]
pub struct CreateSongRequest {
    pub group: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateSongResponse {
    pub id: i64,
    pub group: String,
    pub name: String,
    pub release_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub text: String,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Deserialize)]
pub struct LibraryParams {
    pub group: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: &Error) -> HandlerError {
    let status = match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::ConstraintViolation(_) | Error::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
        Error::External(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn bad_request(message: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Run blocking work (SQLite behind a mutex, outbound HTTP) off the async
/// runtime so request workers are never stalled on it.
async fn run_blocking<T, F>(work: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
        })?
        .map_err(|err| error_response(&err))
}

pub async fn add_song(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSongRequest>,
) -> Result<(StatusCode, Json<CreateSongResponse>), HandlerError> {
    if req.group.trim().is_empty() || req.name.trim().is_empty() {
        return Err(bad_request("group and name must be non-empty"));
    }

    let external_api = state.external_api.clone();
    let (group, name) = (req.group.clone(), req.name.clone());
    let fetched =
        run_blocking(move || external::fetch_song(&external_api, &group, &name)).await?;

    let release_date = NaiveDate::parse_from_str(&fetched.release_date, "%Y-%m-%d")
        .map_err(|err| {
            error_response(&Error::External(format!("unparseable release date: {err}")))
        })?;

    let service = state.service.clone();
    let (group, name) = (req.group.clone(), req.name.clone());
    let (link, text) = (fetched.link.clone(), fetched.text.clone());
    let id =
        run_blocking(move || service.add_song(&group, &name, link, release_date, &text)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSongResponse {
            id,
            group: req.group,
            name: req.name,
            release_date,
            link: fetched.link,
            text: fetched.text,
        }),
    ))
}

pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HandlerError> {
    let service = state.service.clone();
    run_blocking(move || service.delete_song(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<SongUpdate>,
) -> Result<StatusCode, HandlerError> {
    let service = state.service.clone();
    run_blocking(move || service.update_song(id, &update)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_lyrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<SongLyrics>, HandlerError> {
    let service = state.service.clone();
    let lyrics =
        run_blocking(move || service.lyrics(id, params.limit.as_deref(), params.offset.as_deref()))
            .await?;
    Ok(Json(lyrics))
}

pub async fn get_library(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LibraryParams>,
) -> Result<Json<Library>, HandlerError> {
    let mut filters = HashMap::new();
    for (key, value) in [
        ("group", &params.group),
        ("name", &params.name),
        ("release_date", &params.release_date),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            filters.insert(key.to_string(), value.to_string());
        }
    }

    let service = state.service.clone();
    let library = run_blocking(move || {
        service.library(&filters, params.limit.as_deref(), params.offset.as_deref())
    })
    .await?;
    Ok(Json(library))
}
