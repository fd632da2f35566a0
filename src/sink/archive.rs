use crate::error::SinkError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::FileOptions;

use super::{Sink, validate_entry_name};

/// Zip archive sink
///
/// Entries are deflated in arrival order. Two items with the same name
/// produce two entries; readers decide which one they surface.
pub struct ArchiveSink {
    path: PathBuf,
    writer: zip::ZipWriter<BufWriter<File>>,
    entries: usize,
}

impl ArchiveSink {
    /// Create (or truncate) the archive at `path`, creating parent directories as needed
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let create_err = |source| SinkError::Create {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(create_err)?;
        }
        let file = File::create(path).map_err(create_err)?;

        debug!(?path, "created archive");
        Ok(Self {
            path: path.to_path_buf(),
            writer: zip::ZipWriter::new(BufWriter::new(file)),
            entries: 0,
        })
    }

    fn entry_options() -> FileOptions {
        FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644)
    }
}

#[async_trait::async_trait]
impl Sink for ArchiveSink {
    async fn write_entry(&mut self, name: &str, payload: &[u8]) -> Result<(), SinkError> {
        validate_entry_name(name)?;

        self.writer.start_file(name, Self::entry_options())?;
        self.writer
            .write_all(payload)
            .map_err(|source| SinkError::Write {
                name: name.to_string(),
                source,
            })?;

        self.entries += 1;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<(), SinkError> {
        let ArchiveSink {
            path,
            mut writer,
            entries,
        } = *self;

        let mut inner = writer.finish()?;
        inner.flush().map_err(|source| SinkError::Finish {
            path: path.clone(),
            source,
        })?;

        info!(?path, entries, "archive finalized");
        Ok(())
    }
}
