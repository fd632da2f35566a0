//! Configuration types for gallery-fetch

use crate::error::{Error, Result};
use crate::sink::Destination;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// HTTP client settings used by [`HttpFetcher`](crate::fetcher::HttpFetcher)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout, the only time bound on a single attempt (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header, required by some image hosts (None = not sent)
    #[serde(default)]
    pub referer: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            referer: None,
        }
    }
}

/// Where and how fetched items are stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pack items into `<dir>/<name>.zip` instead of `<dir>/<name>/` (default: true)
    #[serde(default = "default_true")]
    pub compress: bool,

    /// Parent directory for the archive or item directory (default: ".")
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compress: true,
            dir: default_output_dir(),
        }
    }
}

/// Immutable settings for one gallery run
///
/// Built once, validated with [`Config::validate`], and handed to
/// [`Pipeline::new`](crate::Pipeline::new). Nothing in the pipeline reads
/// global state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// External gallery identifier, also the middle segment of every item URL
    pub gallery_id: String,

    /// Human-friendly name used for the output archive/directory (defaults to the id)
    #[serde(default)]
    pub gallery_name: Option<String>,

    /// Resolved base URL; items are fetched from `<base_url>/<gallery_id>/<item>`
    pub base_url: String,

    /// Number of concurrent workers (default: 10)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Fetch attempts per item, including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Job queue capacity; 0 makes the dispatcher hand items over one at a time
    #[serde(default)]
    pub queue_capacity: usize,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Create a config with defaults for everything but the gallery and base URL
    pub fn new(gallery_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            gallery_id: gallery_id.into(),
            base_url: base_url.into(),
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            ..Default::default()
        }
    }

    /// Load a config from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Check every setting the pipeline relies on
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.gallery_id.trim().is_empty() {
            return Err(Error::config("gallery_id", "gallery id must not be empty"));
        }
        if self.gallery_id.contains('/') {
            return Err(Error::config(
                "gallery_id",
                format!("gallery id {:?} must not contain '/'", self.gallery_id),
            ));
        }
        if self.workers == 0 {
            return Err(Error::config("workers", "at least one worker is required"));
        }
        if self.max_attempts == 0 {
            return Err(Error::config(
                "max_attempts",
                "at least one download attempt is required",
            ));
        }
        if self.http.timeout.is_zero() {
            return Err(Error::config("http.timeout", "timeout must be non-zero"));
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| {
            Error::config("base_url", format!("invalid base url {:?}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "base_url",
                format!("unsupported scheme {:?}, expected http or https", url.scheme()),
            ));
        }

        Ok(())
    }

    /// Name used for the archive or directory
    pub fn display_name(&self) -> &str {
        self.gallery_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.gallery_id)
    }

    /// Output destination derived from the output settings and display name
    pub fn destination(&self) -> Destination {
        if self.output.compress {
            Destination::Archive(self.output.dir.join(format!("{}.zip", self.display_name())))
        } else {
            Destination::Directory(self.output.dir.join(self.display_name()))
        }
    }

    /// Download URL for a single item
    pub fn item_url(&self, item: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.gallery_id,
            item
        )
    }
}

// Default value functions
fn default_workers() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config::new("1234", "https://img.example.com/galleries")
    }

    fn config_key(err: Error) -> Option<String> {
        match err {
            Error::Config { key, .. } => key,
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn new_applies_documented_defaults() {
        let config = valid();

        assert_eq!(config.workers, 10);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.queue_capacity, 0, "queue should be a rendezvous by default");
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert!(config.output.compress);
        assert_eq!(config.output.dir, PathBuf::from("."));
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = Config {
            workers: 0,
            ..valid()
        };

        let key = config_key(config.validate().unwrap_err());
        assert_eq!(key.as_deref(), Some("workers"));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let config = Config {
            max_attempts: 0,
            ..valid()
        };

        let key = config_key(config.validate().unwrap_err());
        assert_eq!(key.as_deref(), Some("max_attempts"));
    }

    #[test]
    fn empty_or_nested_gallery_id_is_rejected() {
        for id in ["", "   ", "12/34"] {
            let config = Config {
                gallery_id: id.to_string(),
                ..valid()
            };
            let key = config_key(config.validate().unwrap_err());
            assert_eq!(key.as_deref(), Some("gallery_id"), "id {id:?}");
        }
    }

    #[test]
    fn base_url_must_be_http() {
        for base in ["not a url", "ftp://files.example.com", ""] {
            let config = Config {
                base_url: base.to_string(),
                ..valid()
            };
            let key = config_key(config.validate().unwrap_err());
            assert_eq!(key.as_deref(), Some("base_url"), "base {base:?}");
        }
    }

    #[test]
    fn item_url_joins_base_gallery_and_item() {
        let config = valid();
        assert_eq!(
            config.item_url("001.jpg"),
            "https://img.example.com/galleries/1234/001.jpg"
        );

        let trailing = Config {
            base_url: "https://img.example.com/galleries/".into(),
            ..valid()
        };
        assert_eq!(
            trailing.item_url("001.jpg"),
            "https://img.example.com/galleries/1234/001.jpg",
            "trailing slash on the base must not double up"
        );
    }

    #[test]
    fn destination_follows_compress_flag_and_name() {
        let archive = Config {
            gallery_name: Some("My Gallery".into()),
            output: OutputConfig {
                compress: true,
                dir: PathBuf::from("out"),
            },
            ..valid()
        };
        assert_eq!(
            archive.destination(),
            Destination::Archive(PathBuf::from("out/My Gallery.zip"))
        );

        let directory = Config {
            output: OutputConfig {
                compress: false,
                dir: PathBuf::from("out"),
            },
            ..valid()
        };
        assert_eq!(
            directory.destination(),
            Destination::Directory(PathBuf::from("out/1234")),
            "name should fall back to the gallery id"
        );
    }

    #[test]
    fn blank_gallery_name_falls_back_to_id() {
        let config = Config {
            gallery_name: Some("  ".into()),
            ..valid()
        };
        assert_eq!(config.display_name(), "1234");
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let json = r#"{
            "gallery_id": "42",
            "base_url": "https://img.example.com",
            "http": { "timeout": 5, "referer": "https://example.com/" },
            "output": { "compress": false }
        }"#;

        let config: Config = serde_json::from_str(json).expect("deserialize failed");

        assert_eq!(config.gallery_id, "42");
        assert_eq!(config.workers, 10);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.http.referer.as_deref(), Some("https://example.com/"));
        assert!(!config.http.user_agent.is_empty());
        assert!(!config.output.compress);
        assert_eq!(config.output.dir, PathBuf::from("."));
    }

    #[test]
    fn from_json_file_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        let config = Config {
            workers: 4,
            ..valid()
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = Config::from_json_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn from_json_file_reports_missing_file_as_io() {
        let err = Config::from_json_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got {err:?}");
    }
}
