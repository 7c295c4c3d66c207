//! Paste routes

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use paste_core::{CoreError, FetchedPaste};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    text: String,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteResponse {
    text: String,
    end_date: Option<NaiveDate>,
}

impl From<FetchedPaste> for PasteResponse {
    fn from(paste: FetchedPaste) -> Self {
        Self {
            text: paste.text,
            end_date: paste.end_date,
        }
    }
}

/// POST /save
async fn save_paste(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!("POST /save ({} bytes)", request.text.len());

    let key = state.engine.save(&request.text, request.end_date).await?;

    Ok((StatusCode::CREATED, Json(SaveResponse { key })))
}

/// GET /{key}
async fn get_paste(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<PasteResponse>, ApiError> {
    debug!("GET paste: {}", key);

    match state.engine.fetch(&key).await? {
        Some(paste) => Ok(Json(paste.into())),
        None => Err(CoreError::NotFound(key).into()),
    }
}

/// DELETE /{key}/delete
async fn delete_paste(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!("DELETE paste: {}", key);

    state.engine.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create paste routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/save", post(save_paste))
        .route("/{key}", get(get_paste))
        .route("/{key}/delete", delete(delete_paste))
}
