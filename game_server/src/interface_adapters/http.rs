// HTTP bootstrap: index page and static files for the client bundle.

use crate::interface_adapters::state::AppState;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::io::ErrorKind;
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

const INDEX_FILE: &str = "index.html";

// Shared HTTP response types for consistent API error payloads.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let path = state.static_dir.join(INDEX_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Html(body).into_response(),
        Err(err) => read_failure(&path, err),
    }
}

pub async fn static_handler(
    State(state): State<Arc<AppState>>,
    Path(requested): Path<String>,
) -> Response {
    let Some(relative) = sanitize_path(&requested) else {
        warn!(path = %requested, "rejected static path");
        return error_response(StatusCode::BAD_REQUEST, "invalid path");
    };

    let path = state.static_dir.join(&relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            debug!(path = %relative.display(), bytes = bytes.len(), %mime, "static file served");
            ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
        }
        Err(err) => read_failure(&path, err),
    }
}

/// Keeps only plain path segments; anything that could escape the root is rejected.
fn sanitize_path(requested: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in FsPath::new(requested).components() {
        match component {
            Component::Normal(segment) => clean.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

fn read_failure(path: &FsPath, err: std::io::Error) -> Response {
    match err.kind() {
        // Directories read as errors too; treat them as missing files.
        ErrorKind::NotFound | ErrorKind::IsADirectory => {
            debug!(path = %path.display(), "static file not found");
            error_response(StatusCode::NOT_FOUND, "file not found")
        }
        _ => {
            error!(path = %path.display(), error = %err, "failed to read static file");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to read file")
        }
    }
}
