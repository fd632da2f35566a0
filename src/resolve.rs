//! Gallery and base URL resolution
//!
//! The pipeline only needs a flat, ordered list of item names and a base URL.
//! Where those come from sits behind two small traits so the CLI, tests and
//! embedding applications can plug in their own sources.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Produces the ordered item list of a gallery.
#[async_trait]
pub trait GalleryResolver: Send + Sync {
    /// Resolve `gallery_id` into a non-empty list of item names.
    ///
    /// The returned order is the order in which items are dispatched.
    async fn resolve_gallery(&self, gallery_id: &str) -> Result<Vec<String>>;
}

/// Produces the base URL items are fetched from.
#[async_trait]
pub trait BaseUrlResolver: Send + Sync {
    /// Resolve the base URL for `gallery_id`. `sample_item` is the first item
    /// of the gallery.
    async fn resolve_base_url(&self, gallery_id: &str, sample_item: &str) -> Result<String>;
}

/// Item list known up front
#[derive(Debug, Clone, Default)]
pub struct StaticGallery {
    items: Vec<String>,
}

impl StaticGallery {
    /// Wrap an in-memory item list
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl GalleryResolver for StaticGallery {
    async fn resolve_gallery(&self, gallery_id: &str) -> Result<Vec<String>> {
        if self.items.is_empty() {
            return Err(Error::Resolve(format!("gallery {gallery_id} has no items")));
        }
        Ok(self.items.clone())
    }
}

/// Item list read from a text file, one item name per line.
///
/// Surrounding whitespace is trimmed; blank lines and lines starting with `#`
/// are skipped.
#[derive(Debug, Clone)]
pub struct ItemListFile {
    path: PathBuf,
}

impl ItemListFile {
    /// Read items from `path` on every resolve
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the list file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse an item list, skipping blank lines and `#` comments
pub fn parse_item_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[async_trait]
impl GalleryResolver for ItemListFile {
    async fn resolve_gallery(&self, gallery_id: &str) -> Result<Vec<String>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Resolve(format!(
                "failed to read item list {}: {e}",
                self.path.display()
            ))
        })?;

        let items = parse_item_list(&contents);
        if items.is_empty() {
            return Err(Error::Resolve(format!(
                "item list {} for gallery {gallery_id} is empty",
                self.path.display()
            )));
        }

        tracing::debug!(
            gallery_id,
            path = %self.path.display(),
            count = items.len(),
            "Loaded item list"
        );
        Ok(items)
    }
}

/// Base URL fixed by configuration
#[derive(Debug, Clone)]
pub struct FixedBaseUrl(pub String);

#[async_trait]
impl BaseUrlResolver for FixedBaseUrl {
    async fn resolve_base_url(&self, _gallery_id: &str, _sample_item: &str) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(Error::Resolve("no base URL configured".to_string()));
        }
        Ok(self.0.clone())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_gallery_keeps_order_and_duplicates() {
        let resolver = StaticGallery::new(["b.jpg", "a.jpg", "b.jpg"]);
        let items = resolver.resolve_gallery("42").await.unwrap();
        assert_eq!(items, vec!["b.jpg", "a.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn empty_static_gallery_is_an_error() {
        let resolver = StaticGallery::default();
        let err = resolver.resolve_gallery("42").await.unwrap_err();
        assert!(matches!(err, Error::Resolve(msg) if msg.contains("42")));
    }

    #[test]
    fn parse_skips_blank_lines_and_comments() {
        let items = parse_item_list("# gallery 42\n001.jpg\n\n  002.png  \n#003.jpg\n004.gif");
        assert_eq!(items, vec!["001.jpg", "002.png", "004.gif"]);
    }

    #[tokio::test]
    async fn item_list_file_reads_items() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("items.txt");
        std::fs::write(&path, "a.jpg\r\nb.jpg\r\n").unwrap();

        let items = ItemListFile::new(&path).resolve_gallery("7").await.unwrap();

        assert_eq!(items, vec!["a.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn missing_item_list_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = ItemListFile::new(temp.path().join("missing.txt"));

        let err = resolver.resolve_gallery("7").await.unwrap_err();

        assert!(matches!(err, Error::Resolve(msg) if msg.contains("missing.txt")));
    }

    #[tokio::test]
    async fn comment_only_item_list_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("items.txt");
        std::fs::write(&path, "# nothing here\n\n").unwrap();

        let err = ItemListFile::new(&path).resolve_gallery("7").await.unwrap_err();

        assert!(matches!(err, Error::Resolve(msg) if msg.contains("empty")));
    }

    #[tokio::test]
    async fn fixed_base_url_ignores_gallery() {
        let resolver = FixedBaseUrl("https://img.example.com/galleries".into());
        assert_eq!(
            resolver.resolve_base_url("1", "a.jpg").await.unwrap(),
            "https://img.example.com/galleries"
        );
        assert!(FixedBaseUrl("  ".into()).resolve_base_url("1", "a.jpg").await.is_err());
    }
}
