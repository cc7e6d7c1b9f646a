use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

/// One converted document, ready for the template.
///
/// The template sees exactly these three fields per entry. `content` is
/// rendered markup and gets inserted into the page unescaped.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// List the markdown files directly under `content_dir`, sorted by path.
///
/// Subdirectories are not descended into; `content_dir/media` in
/// particular holds images, not documents. A missing content directory is
/// an error, there is nothing to build from.
pub fn discover_documents(content_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(content_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(into_io_error)?;
        let path = entry.path();
        if path.is_file() && path.extension().map(|ext| ext == "md").unwrap_or(false) {
            debug!("discovered document: {}", path.display());
            documents.push(path.to_path_buf());
        }
    }
    documents.sort();
    Ok(documents)
}

fn into_io_error(err: walkdir::Error) -> io::Error {
    let msg = err.to_string();
    err.into_io_error().unwrap_or_else(|| io::Error::other(msg))
}
