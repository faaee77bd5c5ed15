// src/storage/mod.rs

pub mod local;

use async_trait::async_trait;

use crate::error::AppError;

pub use local::LocalObjectStore;

/// Prefix every post image is uploaded under.
pub const PUBLIC_PREFIX: &str = "public";

/// Binary object storage for post images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` at `path` inside the bucket and returns the stored path.
    /// Fails with `Conflict` when an object already exists at that path.
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, AppError>;

    /// Removes the object at `path`. Returns whether one existed.
    async fn delete(&self, path: &str) -> Result<bool, AppError>;

    fn bucket(&self) -> &str;
}

/// Deterministic public read URL of a stored object.
pub fn public_url(base: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base.trim_end_matches('/'),
        bucket,
        path.trim_start_matches('/')
    )
}

/// Object path of an uploaded image: the fixed public prefix plus the file's own name.
/// Directory components are dropped; an empty or dot-only name is rejected.
pub fn image_path(file_name: &str) -> Result<String, AppError> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return Err(AppError::Validation("Image file name is invalid".to_string()));
    }

    Ok(format!("{}/{}", PUBLIC_PREFIX, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_follows_storage_pattern() {
        assert_eq!(
            public_url("https://cdn.example.com/", "post-images", "public/dune.png"),
            "https://cdn.example.com/storage/v1/object/public/post-images/public/dune.png"
        );
    }

    #[test]
    fn image_path_keeps_only_the_file_name() {
        assert_eq!(image_path("dune.png").unwrap(), "public/dune.png");
        assert_eq!(image_path("../../etc/passwd").unwrap(), "public/passwd");
        assert_eq!(image_path("C:\\pics\\cover.jpg").unwrap(), "public/cover.jpg");
        assert!(image_path("..").is_err());
        assert!(image_path("dir/").is_err());
    }
}
