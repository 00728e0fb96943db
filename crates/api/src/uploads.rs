//! Uploaded-file storage: store bytes, return a path.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Check an upload's declared media type.
pub fn allowed_mime(mime: &str) -> bool {
    matches!(mime, "image/jpeg" | "image/png" | "image/webp")
}

/// File storage rooted at the configured uploads directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the uploads directory if it doesn't exist.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Generate a collision-resistant file name, keeping the original
    /// extension when present and falling back to one derived from the
    /// media type.
    pub fn generate_file_name(original_name: Option<&str>, mime: &str) -> String {
        let ext_from_name = original_name
            .and_then(|name| std::path::Path::new(name).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()));

        let extension = ext_from_name.unwrap_or_else(|| mime_extension(mime).to_string());

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        format!("{}-{}{}", millis, Uuid::new_v4().simple(), extension)
    }

    /// Write uploaded bytes under the store root.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(self.root.join(file_name), bytes).await
    }

    /// The stored public path for a file name.
    pub fn public_path(file_name: &str) -> String {
        format!("uploads/{file_name}")
    }
}

fn mime_extension(mime: &str) -> &'static str {
    match mime {
        "image/png" => ".png",
        "image/webp" => ".webp",
        _ => ".jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_mime() {
        assert!(allowed_mime("image/jpeg"));
        assert!(allowed_mime("image/png"));
        assert!(allowed_mime("image/webp"));
        assert!(!allowed_mime("image/gif"));
        assert!(!allowed_mime("text/html"));
    }

    #[test]
    fn test_generate_file_name_keeps_extension() {
        let name = UploadStore::generate_file_name(Some("Holiday Pic.PNG"), "image/png");
        assert!(name.ends_with(".png"));

        let name = UploadStore::generate_file_name(Some("shot.jpeg"), "image/jpeg");
        assert!(name.ends_with(".jpeg"));
    }

    #[test]
    fn test_generate_file_name_falls_back_to_mime() {
        let name = UploadStore::generate_file_name(None, "image/webp");
        assert!(name.ends_with(".webp"));

        let name = UploadStore::generate_file_name(Some("noext"), "image/jpeg");
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_generated_names_are_unique() {
        let a = UploadStore::generate_file_name(None, "image/png");
        let b = UploadStore::generate_file_name(None, "image/png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_path() {
        assert_eq!(
            UploadStore::public_path("123-abc.png"),
            "uploads/123-abc.png"
        );
    }

    #[tokio::test]
    async fn test_save_round_trip() {
        let dir = std::env::temp_dir().join(format!("glimmer-uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&dir);
        store.ensure_dir().await.unwrap();

        store.save("test.bin", b"hello").await.unwrap();
        let read = tokio::fs::read(dir.join("test.bin")).await.unwrap();
        assert_eq!(read, b"hello");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
