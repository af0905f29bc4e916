//! HTTP handler serving files from the served directory.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::Path as FsPath;

use crate::utils::security;

use super::ServeState;

/// Reads `<dir>/<name>` if `name` is a single plain segment naming a regular
/// file. `Ok(None)` means there is nothing servable under that name.
pub async fn read_served_file(dir: &FsPath, name: &str) -> std::io::Result<Option<Vec<u8>>> {
    if security::validate_filename(name).is_err() {
        return Ok(None);
    }

    let path = dir.join(name);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(bytes)),
        // removed between metadata and read
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// `GET /:file`
pub async fn serve_file(Path(file): Path<String>, State(state): State<ServeState>) -> Response {
    match read_served_file(state.dir(), &file).await {
        Ok(Some(bytes)) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            tracing::debug!("Serving {} ({} bytes)", file, bytes.len());
            ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
        }
        Ok(None) => {
            tracing::debug!("Not found: {}", file);
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", file, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
