//! Product image storage.
//!
//! Images live under `{root}/{bucket}/{object}` on disk and are addressed by
//! public URLs of the form `{public_url}/{bucket}/{object}`.

use super::product::now_millis;
use super::validation::validate_image;
use crate::error::CatalogError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use xxhash_rust::xxh3::xxh3_64;

/// Bucket used when none is configured.
pub const DEFAULT_BUCKET: &str = "product-images";

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-backed image bucket.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_url: String,
    bucket: String,
    max_mb: u64,
}

impl ImageStore {
    pub fn new(
        root: impl Into<PathBuf>,
        public_url: impl Into<String>,
        bucket: impl Into<String>,
        max_mb: u64,
    ) -> Self {
        let public_url = public_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_url,
            bucket: bucket.into(),
            max_mb,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Public URL of an object in this bucket.
    pub fn public_url(&self, object: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, object)
    }

    /// Object path inside the bucket, taken from everything after `"{bucket}/"`.
    pub fn object_path_from_url(&self, url: &str) -> Option<String> {
        let marker = format!("{}/", self.bucket);
        let (_, object) = url.split_once(&marker)?;
        (!object.is_empty()).then(|| object.to_string())
    }

    /// Whether `url` points into this bucket.
    pub fn owns(&self, url: &str) -> bool {
        self.object_path_from_url(url).is_some()
    }

    /// Store an image and return its public URL.
    ///
    /// Without an explicit `file_name` the object is named
    /// `{millis}-{random}.{ext}` using the extension of `original_name`.
    /// Existing objects are never overwritten.
    pub async fn upload(
        &self,
        bytes: &[u8],
        original_name: &str,
        content_type: &str,
        file_name: Option<&str>,
    ) -> Result<String, CatalogError> {
        validate_image(content_type, bytes.len() as u64, self.max_mb)?;

        let object = match file_name {
            Some(name) => sanitize_object_name(name).ok_or_else(|| {
                CatalogError::InvalidImageName {
                    name: name.to_string(),
                }
            })?,
            None => generate_object_name(original_name),
        };

        let dir = self.bucket_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| backend_error(e, &dir))?;

        let path = dir.join(&object);
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        let mut file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(CatalogError::ImageExists { name: object });
            }
            Err(e) => return Err(backend_error(e, &path)),
        };

        file.write_all(bytes)
            .await
            .map_err(|e| backend_error(e, &path))?;
        file.flush().await.map_err(|e| backend_error(e, &path))?;

        tracing::info!("Uploaded image {} ({} bytes)", object, bytes.len());
        Ok(self.public_url(&object))
    }

    /// Delete the object a public URL points to.
    pub async fn delete(&self, url: &str) -> Result<(), CatalogError> {
        let object = self
            .object_path_from_url(url)
            .and_then(|object| sanitize_object_name(&object))
            .ok_or_else(|| CatalogError::InvalidImageUrl {
                url: url.to_string(),
            })?;

        let path = self.bucket_dir().join(&object);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| backend_error(e, &path))?;

        tracing::info!("Deleted image {}", object);
        Ok(())
    }
}

fn backend_error(e: std::io::Error, path: &Path) -> CatalogError {
    CatalogError::Backend(anyhow::Error::new(e).context(format!("image store: {}", path.display())))
}

/// Reject names that would escape the bucket directory.
fn sanitize_object_name(name: &str) -> Option<String> {
    let name = name.trim();
    let valid = !name.is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != "..";
    valid.then(|| name.to_string())
}

fn generate_object_name(original_name: &str) -> String {
    let millis = now_millis();
    let count = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    let random = xxh3_64(format!("{original_name}\u{1f}{millis}\u{1f}{count}").as_bytes());

    let ext = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin")
        .to_ascii_lowercase();

    format!("{}-{:013x}.{}", millis, random >> 12, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn store(root: &Path) -> ImageStore {
        ImageStore::new(root, "https://cdn.example.com/storage/", DEFAULT_BUCKET, 5)
    }

    #[rstest]
    #[case("https://cdn.example.com/storage/product-images/a.png", Some("a.png"))]
    #[case("https://cdn.example.com/storage/other/a.png", None)]
    #[case("https://cdn.example.com/storage/product-images/", None)]
    fn extracts_object_path(#[case] url: &str, #[case] expected: Option<&str>) {
        let images = store(Path::new("/tmp"));
        check!(images.object_path_from_url(url).as_deref() == expected);
    }

    #[test]
    fn generated_names_keep_extension() {
        let name = generate_object_name("Photo.JPG");
        check!(name.ends_with(".jpg"));
        check!(name.split('-').count() == 2);
        check!(generate_object_name("no-extension").ends_with(".bin"));
    }

    #[tokio::test]
    async fn upload_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let images = store(dir.path());

        let url = images
            .upload(b"png-bytes", "cat.png", "image/png", None)
            .await
            .unwrap();
        check!(url.starts_with("https://cdn.example.com/storage/product-images/"));

        let object = images.object_path_from_url(&url).unwrap();
        let path = dir.path().join(DEFAULT_BUCKET).join(&object);
        check!(std::fs::read(&path).unwrap() == b"png-bytes");

        images.delete(&url).await.unwrap();
        check!(!path.exists());
    }

    #[tokio::test]
    async fn upload_refuses_overwrite_and_bad_types() {
        let dir = tempfile::tempdir().unwrap();
        let images = store(dir.path());

        images
            .upload(b"x", "a.gif", "image/gif", Some("fixed.gif"))
            .await
            .unwrap();
        let_assert!(
            Err(CatalogError::ImageExists { .. }) = images
                .upload(b"y", "a.gif", "image/gif", Some("fixed.gif"))
                .await
        );
        let_assert!(
            Err(CatalogError::InvalidImage(_)) =
                images.upload(b"x", "a.txt", "text/plain", None).await
        );
    }

    #[rstest]
    #[case("../outside.png")]
    #[case("nested/name.png")]
    #[case("")]
    #[tokio::test]
    async fn upload_rejects_unsafe_names(#[case] name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let images = store(dir.path());

        let_assert!(
            Err(CatalogError::InvalidImageName { name: rejected }) = images
                .upload(b"x", "a.png", "image/png", Some(name))
                .await
        );
        check!(rejected == name);
        check!(!dir.path().join(DEFAULT_BUCKET).exists());
    }

    #[tokio::test]
    async fn delete_rejects_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let images = store(dir.path());

        let_assert!(
            Err(CatalogError::InvalidImageUrl { .. }) =
                images.delete("https://elsewhere.com/img.png").await
        );
        let_assert!(
            Err(CatalogError::InvalidImageUrl { .. }) = images
                .delete("https://cdn.example.com/storage/product-images/../secret")
                .await
        );
    }
}
