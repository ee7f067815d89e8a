//! Scan image storage and static serving.
//!
//! Uploads are stored once as normalized PNGs under the upload directory and
//! are never moved or deleted by scan approval or clearing; inventory rows
//! keep pointing at them.
//!
//!   GET /uploads/:filename    serve a stored image

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use robowarehouse_vision::{detect_mime_type, is_inline_safe};

/// Characters allowed to survive from the client's file name.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());

const MAX_STEM_LEN: usize = 64;
const FALLBACK_STEM: &str = "scan";

/// Reduce a client-supplied file name to a safe stem.
pub fn sanitize_stem(original: Option<&str>) -> String {
    let stem = original
        .and_then(|name| FsPath::new(name).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cleaned = UNSAFE_CHARS.replace_all(stem, "_");
    let cleaned: String = cleaned.trim_matches('_').chars().take(MAX_STEM_LEN).collect();
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned
    }
}

/// `<stem>_<8 hex chars>.png`
pub fn unique_filename(original: Option<&str>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}.png", sanitize_stem(original), &suffix[..8])
}

/// Write a normalized PNG into the upload directory and return its path.
pub async fn store_image(upload_dir: &FsPath, original: Option<&str>, png: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(upload_dir).await.with_context(|| {
        format!("Failed to create upload directory: {}", upload_dir.display())
    })?;
    let path = upload_dir.join(unique_filename(original));
    fs::write(&path, png)
        .await
        .with_context(|| format!("Failed to write upload: {}", path.display()))?;
    debug!(path = %path.display(), size = png.len(), "Stored scan image");
    Ok(path)
}

/// State shared by upload serving routes.
#[derive(Clone)]
pub struct UploadsState {
    pub upload_dir: Arc<PathBuf>,
}

/// Build the uploads router. Mount at `/uploads`.
pub fn uploads_router<S>(upload_dir: PathBuf) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = UploadsState {
        upload_dir: Arc::new(upload_dir),
    };
    Router::new()
        .route("/:filename", get(serve_upload))
        .with_state(state)
}

/// GET /:filename: stream a stored image.
async fn serve_upload(
    Path(filename): Path<String>,
    State(state): State<UploadsState>,
) -> Response {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        warn!(filename = %filename, "Rejected suspicious upload path");
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.upload_dir.join(&filename);
    match fs::read(&path).await {
        Ok(bytes) => {
            let mime = detect_mime_type(&path);
            let disposition = if is_inline_safe(mime) {
                format!("inline; filename=\"{filename}\"")
            } else {
                format!("attachment; filename=\"{filename}\"")
            };

            let mut response = (StatusCode::OK, bytes).into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400"),
            );
            response
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Image not found").into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read upload");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read image").into_response()
        }
    }
}
