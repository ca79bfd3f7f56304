use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::utils::time::epoch_millis;

/// Local-disk object store for CV attachments. Keys are bucket-relative
/// (`{student_id}/{student_id}_{epoch_ms}.{ext}`), namespaced per student
/// and timestamp-qualified so repeated submissions never collide.
#[derive(Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Builds the storage key for a student's attachment. The extension is
    /// lowercased and restricted to alphanumerics so a key can never
    /// escape the bucket.
    pub fn key_for(student_id: Uuid, extension: &str) -> Result<String> {
        let ext = extension.to_lowercase();
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::BadRequest(format!(
                "Invalid attachment extension: {}",
                extension
            )));
        }
        Ok(format!(
            "{student_id}/{student_id}_{}.{ext}",
            epoch_millis()
        ))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub async fn store(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        tokio::fs::remove_file(self.path_for(key)).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }
}

/// Extension of an uploaded filename, lowercased.
pub fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_by_student_and_timestamped() {
        let student = Uuid::new_v4();
        let key = StorageService::key_for(student, "PDF").unwrap();
        let (dir, file) = key.split_once('/').unwrap();
        assert_eq!(dir, student.to_string());
        assert!(file.starts_with(&format!("{}_", student)));
        assert!(file.ends_with(".pdf"));
    }

    #[test]
    fn hostile_extension_is_rejected() {
        let student = Uuid::new_v4();
        assert!(StorageService::key_for(student, "../etc").is_err());
        assert!(StorageService::key_for(student, "").is_err());
        assert!(StorageService::key_for(student, "p/df").is_err());
    }

    #[test]
    fn extension_of_takes_the_last_component() {
        assert_eq!(extension_of("cv.final.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("resume.docx").as_deref(), Some("docx"));
        assert_eq!(extension_of("noext"), None);
    }

    #[tokio::test]
    async fn store_then_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageService::new(dir.path());
        let key = StorageService::key_for(Uuid::new_v4(), "pdf").unwrap();

        storage.store(&key, b"%PDF-1.4").await.unwrap();
        assert!(storage.exists(&key).await);

        storage.remove(&key).await.unwrap();
        assert!(!storage.exists(&key).await);
    }
}
