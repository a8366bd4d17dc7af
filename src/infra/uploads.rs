//! Local files staged for upload to the media library.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::future::join_all;
use thiserror::Error;
use tokio::fs;

use crate::application::repos::UploadFile;

#[derive(Debug, Error)]
pub enum UploadSourceError {
    #[error("`{}` does not name a file", path.display())]
    NotAFile { path: PathBuf },
    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a file and guess its content type from the extension.
pub async fn load_upload(path: &Path) -> Result<UploadFile, UploadSourceError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| UploadSourceError::NotAFile {
            path: path.to_path_buf(),
        })?
        .to_string();

    let bytes = fs::read(path)
        .await
        .map_err(|source| UploadSourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(UploadFile::new(file_name, content_type, Bytes::from(bytes)))
}

/// Load every path, keeping per-file results in input order.
pub async fn load_uploads(paths: &[PathBuf]) -> Vec<Result<UploadFile, UploadSourceError>> {
    join_all(paths.iter().map(|path| load_upload(path))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guesses_content_type_from_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cover.png");
        std::fs::write(&path, b"\x89PNG").expect("write");

        let upload = load_upload(&path).await.expect("load");
        assert_eq!(upload.file_name, "cover.png");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.size(), 4);
    }

    #[tokio::test]
    async fn unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.penna-unknown");
        std::fs::write(&path, b"x").expect("write");

        let upload = load_upload(&path).await.expect("load");
        assert_eq!(upload.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_files_fail_individually() {
        let dir = tempfile::tempdir().expect("tempdir");
        let present = dir.path().join("a.mp3");
        std::fs::write(&present, b"id3").expect("write");
        let missing = dir.path().join("b.mp3");

        let results = load_uploads(&[present, missing]).await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(UploadSourceError::Read { .. })));
    }
}
