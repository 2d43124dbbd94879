//! Media uploads.
//!
//! Files stream straight to `<root>/images` or `<root>/videos`; nothing is
//! buffered whole in memory and a rejected upload leaves no file behind.

use crate::core::{CmsError, Result};
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

lazy_static! {
    static ref UNSAFE_NAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

const FALLBACK_NAME: &str = "upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Multipart field carrying the file.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }

    /// Response key holding the public URL.
    pub fn url_key(self) -> &'static str {
        match self {
            Self::Image => "imageUrl",
            Self::Video => "videoUrl",
        }
    }

    pub fn missing_message(self) -> String {
        format!("No {} uploaded", self.field_name())
    }
}

/// Maps an allowed content type to its media kind.
pub fn classify(content_type: &str) -> Option<MediaKind> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/png" => Some(MediaKind::Image),
        "video/mp4" | "video/mpeg" => Some(MediaKind::Video),
        _ => None,
    }
}

/// Reduces a client-supplied file name to a safe single path component.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned = UNSAFE_NAME_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub kind: MediaKind,
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

pub struct UploadReceiver {
    root: PathBuf,
    max_bytes: u64,
    base_url: Option<String>,
}

impl UploadReceiver {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64, base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            max_bytes,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Creates the per-kind directories; safe to call repeatedly.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for kind in [MediaKind::Image, MediaKind::Video] {
            let dir = self.root.join(kind.dir_name());
            fs::create_dir_all(&dir).await.map_err(|e| {
                CmsError::store(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Streams one file to disk after checking its declared type.
    pub async fn store<S>(
        &self,
        expected: MediaKind,
        original_name: Option<&str>,
        content_type: Option<&str>,
        mut chunks: S,
    ) -> Result<StoredUpload>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        let content_type = content_type.unwrap_or("application/octet-stream");
        match classify(content_type) {
            Some(kind) if kind == expected => {}
            Some(_) => {
                return Err(CmsError::UnsupportedMediaType(format!(
                    "{content_type} cannot be uploaded as {}",
                    expected.field_name()
                )));
            }
            None => {
                return Err(CmsError::UnsupportedMediaType(format!(
                    "{content_type}. Only JPEG, PNG, MP4, and MPEG are allowed."
                )));
            }
        }

        let dir = self.root.join(expected.dir_name());
        let safe_name = sanitize_file_name(original_name.unwrap_or(FALLBACK_NAME));
        let (file_name, path, mut file) = create_unique(&dir, &safe_name).await?;

        let size = match write_chunks(&mut file, &mut chunks, self.max_bytes).await {
            Ok(size) => size,
            Err(err) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %remove_err, "failed to remove partial upload");
                }
                debug!(file = %file_name, error = %err, "upload aborted");
                return Err(err);
            }
        };

        info!(kind = expected.field_name(), file = %file_name, size, "upload stored");
        Ok(StoredUpload {
            kind: expected,
            file_name,
            path,
            size,
        })
    }

    /// Public URL of a stored file, rooted at the configured base or the
    /// request's `Host`.
    pub fn public_url(&self, upload: &StoredUpload, host: Option<&str>) -> String {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => format!("http://{}", host.unwrap_or("localhost")),
        };
        format!(
            "{base}/uploads/{}/{}",
            upload.kind.dir_name(),
            upload.file_name
        )
    }
}

async fn write_chunks<S>(file: &mut File, chunks: &mut S, max_bytes: u64) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let mut size: u64 = 0;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(CmsError::PayloadTooLarge { limit: max_bytes });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

/// Opens `<millis>-<name>` exclusively, adding a random segment on collision.
async fn create_unique(dir: &Path, safe_name: &str) -> Result<(String, PathBuf, File)> {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut file_name = format!("{millis}-{safe_name}");
    for _ in 0..3 {
        let path = dir.join(&file_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file_name, path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let suffix = uuid::Uuid::new_v4().simple().to_string();
                file_name = format!("{millis}-{}-{safe_name}", &suffix[..8]);
            }
            Err(err) => {
                return Err(CmsError::store(format!(
                    "Failed to create {}: {}",
                    path.display(),
                    err
                )));
            }
        }
    }
    Err(CmsError::store("Could not pick a unique upload file name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tempfile::TempDir;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|part| Ok(Bytes::from_static(*part)))
                .collect::<Vec<_>>(),
        )
    }

    async fn receiver(max_bytes: u64) -> (TempDir, UploadReceiver) {
        let temp_dir = TempDir::new().unwrap();
        let receiver = UploadReceiver::new(temp_dir.path(), max_bytes, None);
        receiver.ensure_dirs().await.unwrap();
        (temp_dir, receiver)
    }

    #[test]
    fn test_classify_allow_list() {
        assert_eq!(classify("image/png"), Some(MediaKind::Image));
        assert_eq!(classify("IMAGE/JPEG"), Some(MediaKind::Image));
        assert_eq!(classify("video/mp4; codecs=avc1"), Some(MediaKind::Video));
        assert_eq!(classify("video/mpeg"), Some(MediaKind::Video));
        assert_eq!(classify("image/gif"), None);
        assert_eq!(classify("application/pdf"), None);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\my cat.jpg"), "my_cat.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), FALLBACK_NAME);
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let (_dir, receiver) = receiver(1024).await;
        let stored = receiver
            .store(
                MediaKind::Image,
                Some("banner.png"),
                Some("image/png"),
                chunks(&[b"\x89PNG", b"data"]),
            )
            .await
            .unwrap();

        assert!(stored.file_name.ends_with("-banner.png"));
        assert_eq!(stored.size, 8);
        assert_eq!(fs::read(&stored.path).await.unwrap(), b"\x89PNGdata");
        assert!(stored.path.starts_with(receiver.root().join("images")));
    }

    #[tokio::test]
    async fn test_disallowed_type_writes_nothing() {
        let (_dir, receiver) = receiver(1024).await;
        let err = receiver
            .store(
                MediaKind::Image,
                Some("doc.pdf"),
                Some("application/pdf"),
                chunks(&[b"%PDF"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::UnsupportedMediaType(_)));

        let mut entries = fs::read_dir(receiver.root().join("images")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kind_must_match_route() {
        let (_dir, receiver) = receiver(1024).await;
        let err = receiver
            .store(MediaKind::Image, Some("clip.mp4"), Some("video/mp4"), chunks(&[b"x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_oversized_upload_is_removed() {
        let (_dir, receiver) = receiver(6).await;
        let err = receiver
            .store(
                MediaKind::Video,
                Some("clip.mp4"),
                Some("video/mp4"),
                chunks(&[b"1234", b"5678"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::PayloadTooLarge { limit: 6 }));

        let mut entries = fs::read_dir(receiver.root().join("videos")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_distinct_files() {
        let (_dir, receiver) = receiver(1024).await;
        let first = receiver
            .store(MediaKind::Image, Some("a.png"), Some("image/png"), chunks(&[b"1"]))
            .await
            .unwrap();
        let second = receiver
            .store(MediaKind::Image, Some("a.png"), Some("image/png"), chunks(&[b"2"]))
            .await
            .unwrap();
        assert_ne!(first.path, second.path);
    }

    #[test]
    fn test_public_url() {
        let upload = StoredUpload {
            kind: MediaKind::Video,
            file_name: "1-clip.mp4".into(),
            path: PathBuf::from("uploads/videos/1-clip.mp4"),
            size: 1,
        };
        let by_host = UploadReceiver::new("uploads", 10, None);
        assert_eq!(
            by_host.public_url(&upload, Some("cms.local:5000")),
            "http://cms.local:5000/uploads/videos/1-clip.mp4"
        );
        let by_base = UploadReceiver::new("uploads", 10, Some("https://cdn.example.com/".into()));
        assert_eq!(
            by_base.public_url(&upload, Some("ignored")),
            "https://cdn.example.com/uploads/videos/1-clip.mp4"
        );
    }
}
