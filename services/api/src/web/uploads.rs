//! services/api/src/web/uploads.rs
//!
//! Temporary on-disk staging for uploaded files. A staged file lives only for
//! the duration of one request and is removed with [`StagedUpload::discard`],
//! or on drop when the request is abandoned before that.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

pub const PDF_MIME: &str = "application/pdf";

/// True when the part looks like a PDF. The declared content type wins; the
/// file extension is only consulted when the client sent no content type.
pub fn is_pdf(file_name: &str, content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => ct
            .split(';')
            .next()
            .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME))
            .unwrap_or(false),
        None => file_name.to_ascii_lowercase().ends_with(".pdf"),
    }
}

/// An uploaded file written to the upload directory.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    original_name: String,
    discarded: bool,
}

impl StagedUpload {
    /// Writes `bytes` under a unique, sanitized name inside `dir`.
    pub async fn stage(dir: &Path, original_name: &str, bytes: &[u8]) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;
        let sanitized = sanitize_filename::sanitize(original_name);
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitized);
        let path = dir.join(stored_name);
        fs::write(&path, bytes).await?;
        Ok(Self {
            path,
            original_name: original_name.to_string(),
            discarded: false,
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }

    /// Removes the staged file. A file that is already gone is not an error.
    pub async fn discard(mut self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete staged upload {}: {}", self.path.display(), e),
        }
        self.discarded = true;
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.discarded {
            return;
        }
        // May run after the request future is gone, so the remove is blocking.
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete abandoned upload {}: {}", self.path.display(), e),
        }
    }
}
