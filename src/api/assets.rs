//! Embedded UI assets
//!
//! In development, falls back to serving from the filesystem.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

const UI_DIR: &str = "ui/dist";

#[derive(Embed)]
#[folder = "ui/dist"]
struct Assets;

/// Serve a file below `/assets/`, embedded first, then from disk
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = format!("assets/{}", path.trim_start_matches('/'));
    match load(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_string())], content).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    load("index.html").and_then(|bytes| String::from_utf8(bytes).ok())
}

fn load(path: &str) -> Option<Vec<u8>> {
    if path.split('/').any(|part| part == "..") {
        return None;
    }
    if let Some(content) = Assets::get(path) {
        return Some(content.data.to_vec());
    }
    std::fs::read(PathBuf::from(UI_DIR).join(path)).ok()
}
