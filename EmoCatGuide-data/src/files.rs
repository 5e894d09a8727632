//! Storage for uploaded report files
//!
//! Files are addressed by a relative storage path of the form
//! `health_reports/{user_id}/{YYYYmmdd_HHMMSS}_{filename}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::repository::RepositoryError;

/// Build the storage path for an uploaded report
pub fn report_storage_path(user_id: &str, filename: &str, uploaded_at: DateTime<Utc>) -> String {
    format!(
        "health_reports/{}/{}_{}",
        sanitize_segment(user_id),
        uploaded_at.format("%Y%m%d_%H%M%S"),
        sanitize_segment(filename)
    )
}

/// Reduce a client-supplied name to a single safe path segment
fn sanitize_segment(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Blob store for report files
#[async_trait]
pub trait FileStoreTrait {
    /// Write `bytes` at `path`, replacing any previous content
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), RepositoryError>;

    /// Read the content stored at `path`
    async fn get(&self, path: &str) -> Result<Vec<u8>, RepositoryError>;

    /// Remove the content at `path`. Removing a missing path succeeds.
    async fn delete(&self, path: &str) -> Result<(), RepositoryError>;
}

/// File store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!("Using local file store at {:?}", root);
        Self { root }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, RepositoryError> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !safe {
            return Err(RepositoryError::Validation(format!("invalid storage path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStoreTrait for LocalFileStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), RepositoryError> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;
        debug!("Stored {} bytes at {:?}", bytes.len(), full_path);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, RepositoryError> {
        let full_path = self.resolve(path)?;
        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepositoryError::NotFound(format!("file {}", path)))
            }
            Err(e) => Err(RepositoryError::Io(e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), RepositoryError> {
        let full_path = self.resolve(path)?;
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!("Removed {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepositoryError::Io(e)),
        }
    }
}

/// In-memory file store for tests
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStore {
    files: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>>,
}

#[cfg(any(test, feature = "mock"))]
impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl FileStoreTrait for InMemoryFileStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), RepositoryError> {
        self.files.lock()?.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, RepositoryError> {
        self.files
            .lock()?
            .get(path)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("file {}", path)))
    }

    async fn delete(&self, path: &str) -> Result<(), RepositoryError> {
        self.files.lock()?.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_storage_path() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 5).unwrap();
        assert_eq!(
            report_storage_path("user-1", "checkup.PDF", at),
            "health_reports/user-1/20240501_083005_checkup.PDF"
        );
        assert_eq!(
            report_storage_path("user-1", "../../etc/passwd", at),
            "health_reports/user-1/20240501_083005_passwd"
        );
        assert_eq!(
            report_storage_path("user-1", "my report.png", at),
            "health_reports/user-1/20240501_083005_my_report.png"
        );
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.put("health_reports/u1/a.png", b"png-bytes").await.unwrap();
        assert_eq!(store.get("health_reports/u1/a.png").await.unwrap(), b"png-bytes");

        let missing = store.get("health_reports/u1/b.png").await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

        store.delete("health_reports/u1/a.png").await.unwrap();
        assert!(matches!(store.get("health_reports/u1/a.png").await, Err(RepositoryError::NotFound(_))));
        store.delete("health_reports/u1/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        assert!(matches!(store.put("../outside", b"x").await, Err(RepositoryError::Validation(_))));
        assert!(matches!(store.get("/etc/passwd").await, Err(RepositoryError::Validation(_))));
    }
}
