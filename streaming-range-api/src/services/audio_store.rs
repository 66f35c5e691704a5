//! Read-only access to the audio directory.

use crate::services::metrics::{record_audio_bytes, record_audio_request};
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const AUDIO_EXTENSION: &str = ".mp3";

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Invalid filename")]
    InvalidFilename,

    #[error("Only MP3 files are supported")]
    UnsupportedType,

    #[error("Audio file not found")]
    NotFound,

    #[error("Failed to read audio file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AudioError {
    fn outcome(&self) -> &'static str {
        match self {
            AudioError::InvalidFilename => "invalid_filename",
            AudioError::UnsupportedType => "unsupported_type",
            AudioError::NotFound => "not_found",
            AudioError::Io { .. } => "error",
        }
    }
}

impl From<AudioError> for AppError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::InvalidFilename | AudioError::UnsupportedType => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            AudioError::NotFound => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            AudioError::Io { .. } => AppError::InternalError(anyhow::Error::new(err)),
        }
    }
}

/// Check the shape of a requested filename without touching the filesystem.
pub fn validate_filename(filename: &str) -> Result<(), AudioError> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.chars().any(char::is_control)
    {
        return Err(AudioError::InvalidFilename);
    }

    if !filename.ends_with(AUDIO_EXTENSION) {
        return Err(AudioError::UnsupportedType);
    }

    Ok(())
}

/// Serves `.mp3` files from a single base directory.
#[derive(Debug, Clone)]
pub struct AudioStore {
    base_dir: PathBuf,
}

impl AudioStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validate, resolve and read a whole audio file.
    pub async fn load(&self, filename: &str) -> Result<Vec<u8>, AudioError> {
        let result = self.load_inner(filename).await;
        match &result {
            Ok(bytes) => {
                record_audio_request("served");
                record_audio_bytes(bytes.len() as u64);
            }
            Err(e) => record_audio_request(e.outcome()),
        }
        result
    }

    async fn load_inner(&self, filename: &str) -> Result<Vec<u8>, AudioError> {
        validate_filename(filename)?;

        let path = self.base_dir.join(filename);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AudioError::NotFound),
            Err(source) => return Err(AudioError::Io { path, source }),
        };
        if !metadata.is_file() {
            return Err(AudioError::NotFound);
        }

        let resolved = self.contained_path(&path).await?;

        match tokio::fs::read(&resolved).await {
            Ok(bytes) => {
                debug!(file = %resolved.display(), size = bytes.len(), "Audio file read");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AudioError::NotFound),
            Err(source) => Err(AudioError::Io {
                path: resolved,
                source,
            }),
        }
    }

    /// Canonicalize `path` and require it to stay inside the base directory.
    async fn contained_path(&self, path: &Path) -> Result<PathBuf, AudioError> {
        let base = tokio::fs::canonicalize(&self.base_dir)
            .await
            .map_err(|source| AudioError::Io {
                path: self.base_dir.clone(),
                source,
            })?;
        let resolved = match tokio::fs::canonicalize(path).await {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AudioError::NotFound),
            Err(source) => {
                return Err(AudioError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if !resolved.starts_with(&base) {
            warn!(
                requested = %path.display(),
                resolved = %resolved.display(),
                "Audio path escapes base directory"
            );
            return Err(AudioError::InvalidFilename);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_and_separators_are_invalid() {
        for name in [
            "",
            "..",
            "../secret.mp3",
            "a..b.mp3",
            "dir/track.mp3",
            "/etc/passwd",
            "..\\track.mp3",
            "track\0.mp3",
            "track\n.mp3",
        ] {
            assert!(
                matches!(validate_filename(name), Err(AudioError::InvalidFilename)),
                "{name:?} should be invalid"
            );
        }
    }

    #[test]
    fn only_mp3_extension_is_supported() {
        for name in ["track.wav", "track.MP3", "track.mp3.txt", "mp3"] {
            assert!(
                matches!(validate_filename(name), Err(AudioError::UnsupportedType)),
                "{name:?} should be unsupported"
            );
        }
        assert!(validate_filename("episode 12 - the open.mp3").is_ok());
    }

    #[tokio::test]
    async fn invalid_name_never_touches_missing_directory() {
        let store = AudioStore::new("/definitely/not/a/real/dir");
        assert!(matches!(
            store.load("../x.mp3").await,
            Err(AudioError::InvalidFilename)
        ));
    }

    #[tokio::test]
    async fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("intro.mp3"), b"ID3\x03fake-audio").unwrap();

        let store = AudioStore::new(dir.path());
        let bytes = store.load("intro.mp3").await.unwrap();
        assert_eq!(bytes, b"ID3\x03fake-audio");
    }

    #[tokio::test]
    async fn missing_file_and_directories_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("folder.mp3")).unwrap();

        let store = AudioStore::new(dir.path());
        assert!(matches!(
            store.load("absent.mp3").await,
            Err(AudioError::NotFound)
        ));
        assert!(matches!(
            store.load("folder.mp3").await,
            Err(AudioError::NotFound)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_outside_base_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.mp3");
        std::fs::write(&secret, b"not for you").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&secret, dir.path().join("link.mp3")).unwrap();

        let store = AudioStore::new(dir.path());
        assert!(matches!(
            store.load("link.mp3").await,
            Err(AudioError::InvalidFilename)
        ));
    }

    #[test]
    fn errors_map_to_http_taxonomy() {
        assert!(matches!(
            AppError::from(AudioError::InvalidFilename),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(AudioError::UnsupportedType),
            AppError::BadRequest(_)
        ));
        assert!(matches!(AppError::from(AudioError::NotFound), AppError::NotFound(_)));
        let io = AudioError::Io {
            path: PathBuf::from("/x.mp3"),
            source: std::io::Error::from(ErrorKind::PermissionDenied),
        };
        assert!(matches!(AppError::from(io), AppError::InternalError(_)));
    }
}
