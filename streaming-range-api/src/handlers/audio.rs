use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

use crate::services::metrics::record_audio_request;
use crate::services::AudioError;
use crate::startup::AppState;

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
/// One day.
pub const AUDIO_CACHE_CONTROL: &str = "public, max-age=86400";

/// GET /api/audio/:filename: return a whole `.mp3` file from the audio directory.
#[tracing::instrument(skip(state))]
pub async fn serve_audio(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    // Undecodable segments (e.g. invalid UTF-8) get the same JSON 400 as other bad names.
    let Path(filename) = filename.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Audio filename could not be decoded");
        record_audio_request("invalid_filename");
        AppError::from(AudioError::InvalidFilename)
    })?;

    let bytes = state.audio.load(&filename).await.map_err(|e| {
        tracing::warn!(filename = %filename, error = %e, "Audio request rejected");
        AppError::from(e)
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(AUDIO_CONTENT_TYPE),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!(
            "inline; filename=\"{}\"",
            filename.replace('"', "\\\"")
        ))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid disposition: {}", e)))?,
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(AUDIO_CACHE_CONTROL),
    );

    tracing::info!(filename = %filename, size = bytes.len(), "Audio file served");

    Ok((StatusCode::OK, headers, bytes).into_response())
}
