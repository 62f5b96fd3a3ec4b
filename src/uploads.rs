use rand::Rng;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Lowercased extension of `filename` if it names a supported image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Random stored name for an upload: 24 hex chars plus the extension.
pub fn generate_filename(ext: &str) -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    format!("{}.{}", hex::encode(bytes), ext)
}

/// Write an uploaded file into `dir` under a fresh random name.
/// Returns the stored filename.
pub async fn store(dir: &Path, original_name: &str, data: &[u8]) -> std::io::Result<String> {
    let ext = image_extension(original_name).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "not an image file")
    })?;

    tokio::fs::create_dir_all(dir).await?;
    let filename = generate_filename(&ext);
    let path: PathBuf = dir.join(&filename);
    tokio::fs::write(&path, data).await?;

    tracing::debug!("Stored upload {} ({} bytes)", path.display(), data.len());
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions_case_insensitively() {
        assert_eq!(image_extension("me.png").as_deref(), Some("png"));
        assert_eq!(image_extension("ME.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("a.b.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("noext"), None);
        assert_eq!(image_extension(""), None);
        assert_eq!(image_extension("../../etc/passwd"), None);
    }

    #[test]
    fn generated_names_are_random_hex() {
        let a = generate_filename("png");
        let b = generate_filename("png");
        assert_ne!(a, b);
        assert_eq!(a.len(), 24 + ".png".len());
        assert!(a[..24].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(a.ends_with(".png"));
    }

    #[tokio::test]
    async fn store_writes_file_under_generated_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("uploads");

        let name = store(&dir, "../../avatar.PNG", b"fake image").await.unwrap();
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert_eq!(std::fs::read(dir.join(&name)).unwrap(), b"fake image");
    }

    #[tokio::test]
    async fn store_refuses_non_images() {
        let tmp = tempfile::tempdir().unwrap();
        let err = store(tmp.path(), "evil.html", b"<script>").await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
