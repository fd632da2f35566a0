use crate::error::SinkError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Sink, validate_entry_name};

/// Plain directory sink writing `<dir>/<name>` per item
///
/// A second item with the same name replaces the first (last write wins).
pub struct DirectorySink {
    dir: PathBuf,
    entries: usize,
}

impl DirectorySink {
    /// Create the directory (and parents) if it does not exist yet
    pub async fn create(dir: &Path) -> Result<Self, SinkError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| SinkError::Create {
                path: dir.to_path_buf(),
                source,
            })?;

        debug!(?dir, "using output directory");
        Ok(Self {
            dir: dir.to_path_buf(),
            entries: 0,
        })
    }
}

#[async_trait::async_trait]
impl Sink for DirectorySink {
    async fn write_entry(&mut self, name: &str, payload: &[u8]) -> Result<(), SinkError> {
        validate_entry_name(name)?;

        tokio::fs::write(self.dir.join(name), payload)
            .await
            .map_err(|source| SinkError::Write {
                name: name.to_string(),
                source,
            })?;

        self.entries += 1;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<(), SinkError> {
        info!(dir = ?self.dir, entries = self.entries, "directory output complete");
        Ok(())
    }
}
